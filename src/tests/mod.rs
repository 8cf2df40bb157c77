// Engine-level test suite. Fixture-style tests go through `crate::runtime`;
// tests that need to inspect the global scope or the raw error drive the
// interpreter directly.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::interpreter::{Interpreter, OutputSink, RuntimeError, Value};
use crate::modules::ModuleLoader;
use crate::parser::Parser;
use crate::tokenizer::Tokenizer;

mod demo_tests;
mod semantics_tests;

pub(crate) struct TestRun {
    pub engine: Interpreter,
    pub result: Result<Value, RuntimeError>,
    output: Rc<RefCell<String>>,
}

impl TestRun {
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    pub fn error(&self) -> &RuntimeError {
        match &self.result {
            Err(error) => error,
            Ok(value) => panic!("expected a runtime error, got {value:?}"),
        }
    }

    /// Innermost message of the failure, line wrapper stripped.
    pub fn error_message(&self) -> String {
        self.error().to_string()
    }
}

/// Execute a source with module resolution rooted at `dir`: top-level
/// statements, then the entry point with the given script arguments.
pub(crate) fn run_in(dir: &Path, source: &str, args: &[String]) -> TestRun {
    let tokens = Tokenizer::new(source).tokenize().expect("tokenize");
    let program = Parser::new(tokens).parse().expect("parse");

    let output = Rc::new(RefCell::new(String::new()));
    let mut engine = Interpreter::new(ModuleLoader::new(vec![dir.to_path_buf()]))
        .with_output(OutputSink::Capture(Rc::clone(&output)));
    let result = engine
        .exec_module(&program)
        .and_then(|()| engine.invoke_entry_point(args));
    TestRun {
        engine,
        result,
        output,
    }
}

pub(crate) fn run(source: &str) -> TestRun {
    run_in(Path::new("."), source, &[])
}
