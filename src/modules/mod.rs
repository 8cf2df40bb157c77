use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{ModulePath, Program};
use crate::parser::{ParseError, Parser};
use crate::tokenizer::{TokenizeError, Tokenizer};

/// Extension of violet source files.
pub const SOURCE_EXTENSION: &str = "vi";

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module '{module}' does not exist")]
    NotFound { module: String },
    #[error("failed to import '{name}' from '{module}'")]
    MissingExport { name: String, module: String },
    #[error("cyclic import detected for module '{module}'")]
    Cyclic { module: String },
    #[error("failed reading module '{}': {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("tokenizer error while loading '{}': {error}", path.display())]
    Tokenize {
        path: PathBuf,
        #[source]
        error: TokenizeError,
    },
    #[error("syntax error while loading '{}' at line {}: {}", path.display(), errors[0].position().line, errors[0])]
    Parse {
        path: PathBuf,
        errors: Vec<ParseError>,
    },
}

/// Resolves import paths against the module search roots and parses module
/// sources. The in-flight stack is shared (one `Rc` per process run) across
/// the nested engines a recursive import spawns, so an import chain that
/// re-enters a module still being executed is detected instead of recursing
/// until the stack dies.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    search_roots: Vec<PathBuf>,
    in_flight: Rc<RefCell<Vec<PathBuf>>>,
}

impl ModuleLoader {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self {
            search_roots,
            in_flight: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    /// Loader for a nested module run: the module's own directory becomes the
    /// first search root; the in-flight stack stays shared.
    pub fn for_module(&self, module_dir: &Path) -> Self {
        let mut roots = vec![module_dir.to_path_buf()];
        for root in &self.search_roots {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }
        Self {
            search_roots: roots,
            in_flight: Rc::clone(&self.in_flight),
        }
    }

    /// Resolve a dotted module path to a source file: segments map to
    /// directories, the final segment to `<name>.vi`.
    pub fn resolve(&self, module: &ModulePath) -> Result<PathBuf, ModuleError> {
        let mut relative = PathBuf::new();
        for segment in &module.segments {
            relative.push(segment);
        }
        relative.set_extension(SOURCE_EXTENSION);

        for root in &self.search_roots {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(ModuleError::NotFound {
            module: module.dotted(),
        })
    }

    /// Read and parse a module source file.
    pub fn load_program(&self, path: &Path) -> Result<Program, ModuleError> {
        let source = fs::read_to_string(path).map_err(|error| ModuleError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let tokens = Tokenizer::new(&source)
            .tokenize()
            .map_err(|error| ModuleError::Tokenize {
                path: path.to_path_buf(),
                error,
            })?;
        Parser::new(tokens)
            .parse()
            .map_err(|errors| ModuleError::Parse {
                path: path.to_path_buf(),
                errors,
            })
    }

    /// Mark a module as executing. Fails when the module is already on the
    /// in-flight stack; the returned guard unmarks it on every exit path.
    pub fn begin(&self, path: &Path, module: &str) -> Result<ImportGuard, ModuleError> {
        let canonical = canonical_path(path);
        if self.in_flight.borrow().contains(&canonical) {
            return Err(ModuleError::Cyclic {
                module: module.to_string(),
            });
        }
        self.in_flight.borrow_mut().push(canonical.clone());
        Ok(ImportGuard {
            in_flight: Rc::clone(&self.in_flight),
            path: canonical,
        })
    }
}

fn canonical_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Removes its module from the in-flight stack when dropped, so the cycle
/// guard is released on normal completion and on error alike.
#[derive(Debug)]
pub struct ImportGuard {
    in_flight: Rc<RefCell<Vec<PathBuf>>>,
    path: PathBuf,
}

impl Drop for ImportGuard {
    fn drop(&mut self) {
        let mut stack = self.in_flight.borrow_mut();
        if let Some(index) = stack.iter().rposition(|entry| entry == &self.path) {
            stack.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_path(segments: &[&str]) -> ModulePath {
        ModulePath {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn resolves_sibling_module_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("helpers.vi"), "let x = 1;\n").expect("write module");

        let loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        let resolved = loader.resolve(&module_path(&["helpers"])).expect("resolve");
        assert_eq!(resolved, dir.path().join("helpers.vi"));
    }

    #[test]
    fn resolves_dotted_path_to_subdirectory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir(dir.path().join("util")).expect("create subdir");
        fs::write(dir.path().join("util/text.vi"), "let x = 1;\n").expect("write module");

        let loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        let resolved = loader
            .resolve(&module_path(&["util", "text"]))
            .expect("resolve");
        assert_eq!(resolved, dir.path().join("util/text.vi"));
    }

    #[test]
    fn missing_module_reports_the_dotted_name() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        let error = loader.resolve(&module_path(&["ghost"])).unwrap_err();
        assert_eq!(error.to_string(), "module 'ghost' does not exist");
    }

    #[test]
    fn search_roots_are_tried_in_order() {
        let first = tempfile::tempdir().expect("create temp dir");
        let second = tempfile::tempdir().expect("create temp dir");
        fs::write(first.path().join("m.vi"), "let a = 1;\n").expect("write");
        fs::write(second.path().join("m.vi"), "let b = 2;\n").expect("write");

        let loader = ModuleLoader::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let resolved = loader.resolve(&module_path(&["m"])).expect("resolve");
        assert_eq!(resolved, first.path().join("m.vi"));
    }

    #[test]
    fn cycle_guard_rejects_reentry_and_releases_on_drop() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("cycle.vi");
        fs::write(&path, "let x = 1;\n").expect("write module");

        let loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        let guard = loader.begin(&path, "cycle").expect("first entry");

        let shared = loader.for_module(dir.path());
        let error = shared.begin(&path, "cycle").unwrap_err();
        assert!(matches!(error, ModuleError::Cyclic { module } if module == "cycle"));

        drop(guard);
        let _reentry = loader.begin(&path, "cycle").expect("after release");
    }

    #[test]
    fn load_program_surfaces_parse_errors_with_path() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("broken.vi");
        fs::write(&path, "let = 1;\n").expect("write module");

        let loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        let error = loader.load_program(&path).unwrap_err();
        assert!(matches!(error, ModuleError::Parse { .. }));
        assert!(error.to_string().contains("broken.vi"));
    }
}
