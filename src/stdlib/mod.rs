//==================================================
// File: stdlib.rs
//==================================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Track violet native modules for std import syntax
// Objective: Resolve reserved-namespace imports to natively supplied callables
//==================================================

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::interpreter::{Interpreter, NativeCallable, RuntimeError, Value};

type ModuleBuilder = fn() -> HashMap<String, Value>;

// Registry stays small so lookups remain predictable and testable.
static NATIVE_MODULES: Lazy<HashMap<&'static str, ModuleBuilder>> = Lazy::new(|| {
    let mut modules: HashMap<&'static str, ModuleBuilder> = HashMap::new();
    modules.insert("std", std_module as ModuleBuilder);
    modules
});

/// Build the export table of a natively supplied module, if one is
/// registered under the dotted name.
pub fn native_module(name: &str) -> Option<HashMap<String, Value>> {
    NATIVE_MODULES.get(name).map(|build| build())
}

fn std_module() -> HashMap<String, Value> {
    let mut exports = HashMap::new();
    exports.insert(
        "print".to_string(),
        Value::Native(NativeCallable::EngineAware {
            name: "print",
            func: native_print,
        }),
    );
    exports.insert(
        "typeof".to_string(),
        Value::Native(NativeCallable::Plain {
            name: "typeof",
            func: native_typeof,
        }),
    );
    exports
}

/// `print` writes its String arguments, concatenated, as one line on the
/// engine's primary output stream. Non-String arguments are rejected —
/// scripts cast first.
fn native_print(args: &[Value], engine: &mut Interpreter) -> Result<Value, RuntimeError> {
    let mut line = String::new();
    for arg in args {
        let Value::String(text) = arg else {
            return Err(RuntimeError::TypeMismatch {
                found: arg.type_name(),
                expected: "String",
            });
        };
        line.push_str(text);
    }
    engine.write_out(&line);
    Ok(Value::Void)
}

/// `typeof` returns the type object of its single argument.
fn native_typeof(args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [value] => Ok(Value::Type(value.tag())),
        _ => Err(RuntimeError::Argument(
            "typeof expects exactly one argument".to_string(),
        )),
    }
}
