use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as ClapParser;

use violet::config::{self, Config};
use violet::interpreter::{ErrorCode, Interpreter, ScriptError};
use violet::modules::ModuleLoader;
use violet::parser::{ParseError, Parser};
use violet::tokenizer::Tokenizer;

#[derive(Debug, ClapParser)]
#[command(
    name = "violet",
    about = "Executes violet source (.vi) files.",
    version
)]
struct Args {
    /// Path to a violet source (.vi) file.
    script: Option<PathBuf>,

    /// Propagate raw runtime errors and emit engine diagnostics
    /// (equivalent to setting VIOLET_DEBUG=1).
    #[arg(short, long)]
    verbose: bool,

    /// Pretty-print the parsed AST before execution.
    #[arg(long)]
    print_ast: bool,

    /// Run every fixture under demos/ and report a pass/fail summary.
    #[arg(long)]
    test: bool,

    /// Arguments forwarded to the script's entry point.
    #[arg(trailing_var_arg = true)]
    script_args: Vec<String>,
}

enum Failure {
    Script(ScriptError),
    Syntax(Vec<ParseError>),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Failure::Script(error) => error.code.exit_code(),
            Failure::Syntax(_) => 1,
        }
    }
}

impl From<ScriptError> for Failure {
    fn from(error: ScriptError) -> Self {
        Failure::Script(error)
    }
}

impl From<violet::tokenizer::TokenizeError> for Failure {
    fn from(error: violet::tokenizer::TokenizeError) -> Self {
        Failure::Script(error.into())
    }
}

impl From<violet::interpreter::RuntimeError> for Failure {
    fn from(error: violet::interpreter::RuntimeError) -> Self {
        Failure::Script(error.into())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("ERROR: {error}");
            return ExitCode::from(1);
        }
    };
    let debug = args.verbose || config.debug || config::debug_from_env();

    if args.test {
        return run_test_suite(&config, debug);
    }

    let Some(script) = args.script.clone() else {
        eprintln!("ERROR: no script file given");
        return ExitCode::from(1);
    };

    match run_script(&script, &args, &config, debug) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            report(&failure);
            ExitCode::from(failure.exit_code())
        }
    }
}

/// All diagnostics land on stderr; the primary stream belongs to the script.
fn report(failure: &Failure) {
    match failure {
        Failure::Syntax(errors) => {
            for error in errors {
                eprintln!("ERROR:{}: {error}", error.position().line);
            }
        }
        Failure::Script(error) if error.code == ErrorCode::RuntimePanic => {
            eprintln!("FATAL: system error occurred: {}", error.message);
        }
        Failure::Script(error) => match error.line {
            Some(line) => eprintln!("ERROR:{line}: {}", error.message),
            None => eprintln!("ERROR: {}", error.message),
        },
    }
}

fn run_script(script: &Path, args: &Args, config: &Config, debug: bool) -> Result<(), Failure> {
    let source = fs::read_to_string(script)
        .with_context(|| format!("failed to read {}", script.display()))
        .map_err(|error| {
            Failure::Script(ScriptError::new(
                ErrorCode::InvalidOperation,
                None,
                format!("{error:#}"),
            ))
        })?;

    let tokens = Tokenizer::new(&source).tokenize()?;
    let program = Parser::new(tokens)
        .parse()
        .map_err(Failure::Syntax)?;

    if args.print_ast {
        println!("{program:#?}");
    }

    let loader = ModuleLoader::new(search_roots(script, config));
    // Guard the root script itself so a self-importing chain is reported as
    // cyclic instead of recursing.
    let module_name = script
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("main")
        .to_string();
    let guard = loader.begin(script, &module_name).map_err(ScriptError::from)?;

    let mut engine = Interpreter::new(loader);
    engine.set_debug(debug);
    engine.run_program(&program, &args.script_args)?;
    drop(guard);
    Ok(())
}

fn search_roots(script: &Path, config: &Config) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(parent) = script.parent() {
        let parent = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        };
        roots.push(parent);
    }
    for path in &config.module_paths {
        if !roots.contains(path) {
            roots.push(path.clone());
        }
    }
    let cwd = PathBuf::from(".");
    if !roots.contains(&cwd) {
        roots.push(cwd);
    }
    roots
}

/// `--test`: sweep the demo fixtures the way the interpreter's own suite
/// does, one engine per file, and summarize.
fn run_test_suite(config: &Config, debug: bool) -> ExitCode {
    let demos_dir = PathBuf::from("demos");
    let mut fixtures = match collect_fixtures(&demos_dir) {
        Ok(fixtures) => fixtures,
        Err(error) => {
            eprintln!("ERROR: {error:#}");
            return ExitCode::from(1);
        }
    };
    fixtures.sort();

    let mut failed = 0usize;
    let total = fixtures.len();
    for fixture in &fixtures {
        println!("\nTEST: {}", fixture.display());
        let args = Args {
            script: Some(fixture.clone()),
            verbose: debug,
            print_ast: false,
            test: false,
            script_args: Vec::new(),
        };
        if let Err(failure) = run_script(fixture, &args, config, debug) {
            report(&failure);
            failed += 1;
        }
    }

    if failed > 0 {
        println!("\n\n-- {failed}/{total} TESTS FAILED --");
        ExitCode::from(1)
    } else {
        println!("\n\n-- {total}/{total} TESTS PASSED --");
        ExitCode::SUCCESS
    }
}

fn collect_fixtures(demos_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(demos_dir)
        .with_context(|| format!("failed to read fixture directory {}", demos_dir.display()))?;
    let mut fixtures = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("vi") {
            fixtures.push(path);
        }
    }
    Ok(fixtures)
}
