//==============================================
// File: runtime.rs
//==============================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Shared runtime helpers for violet tests
// Objective: Execute .vi sources with consistent module resolution and a
//            captured output stream for assertions
//==============================================

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::interpreter::{Interpreter, OutputSink, ScriptError};
use crate::modules::ModuleLoader;
use crate::parser::Parser;
use crate::tokenizer::Tokenizer;

/// Captured result of a successful run.
#[derive(Debug)]
pub struct RunOutput {
    pub stdout: String,
}

/// Run a source string with module resolution rooted at the process working
/// directory.
pub fn run_source(source: &str) -> Result<RunOutput, ScriptError> {
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    run_source_in(&root, source)
}

/// Run a source string with module resolution rooted at `dir` — the shape
/// import tests want: write sibling `.vi` files into a temp dir, then run.
pub fn run_source_in(dir: &Path, source: &str) -> Result<RunOutput, ScriptError> {
    let tokens = Tokenizer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse().map_err(first_parse_error)?;

    let buffer = Rc::new(RefCell::new(String::new()));
    let loader = ModuleLoader::new(vec![dir.to_path_buf()]);
    let mut engine = Interpreter::new(loader).with_output(OutputSink::Capture(Rc::clone(&buffer)));
    engine.run_program(&program, &[])?;

    let stdout = buffer.borrow().clone();
    Ok(RunOutput { stdout })
}

/// Run a `.vi` fixture relative to the crate root.
pub fn run_file(relative_path: &str) -> Result<RunOutput, ScriptError> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let script_path = manifest_dir.join(relative_path);
    let source = fs::read_to_string(&script_path)
        .unwrap_or_else(|err| panic!("read {} failed: {}", script_path.display(), err));
    let root = script_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(manifest_dir);
    run_source_in(&root, &source)
}

fn first_parse_error(errors: Vec<crate::parser::ParseError>) -> ScriptError {
    errors
        .into_iter()
        .next()
        .expect("parse failure reports at least one error")
        .into()
}
