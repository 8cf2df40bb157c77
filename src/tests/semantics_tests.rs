// The observable contract of the evaluation engine: arithmetic, list
// construction, binding rules, return-type inference, eager nil-coalescing,
// casts, and call arity.

use super::{run, run_in};
use crate::interpreter::{RuntimeError, TypeTag, Value};

#[test]
fn integer_division_truncates_and_rejects_zero() {
    let run = run(concat!(
        "import { print } from std;\n",
        "fun main() {\n",
        "    let a = 7 / 2;\n",
        "    print(a -> String);\n",
        "    let negative = 0 - 7;\n",
        "    let b = negative / 2;\n",
        "    print(b -> String);\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "3\n-3\n");

    let failing = super::run("fun main() { let x = 1 / 0; }\n");
    assert_eq!(failing.error_message(), "division by zero");
    assert_eq!(failing.error().line(), Some(1));
}

#[test]
fn empty_list_literal_never_evaluates() {
    let run = run("fun main() { let xs = []; }\n");
    assert_eq!(
        run.error_message(),
        "cannot infer the element type of an empty list"
    );
}

#[test]
fn mixed_list_literal_fails_homogeneity() {
    let run = run("fun main() { let xs = [1, \"x\"]; }\n");
    assert_eq!(
        run.error_message(),
        "multi-typed lists are invalid (found 'String', expected 'Integer')"
    );
}

#[test]
fn homogeneous_list_literal_evaluates() {
    let run = run(concat!(
        "import { print, typeof } from std;\n",
        "fun main() {\n",
        "    let xs = [1, 2, 3];\n",
        "    if (typeof(xs) == List) { print(\"list\"); }\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "list\n");
}

#[test]
fn const_bindings_cannot_be_reassigned() {
    let run = run("fun main() { let const x = 1; x = 2; }\n");
    assert_eq!(
        run.error_message(),
        "constant variable 'x' cannot be reassigned"
    );
}

#[test]
fn plain_bindings_reassign_in_place() {
    let run = run(concat!(
        "import { print } from std;\n",
        "fun main() {\n",
        "    let x = 1;\n",
        "    x = 2;\n",
        "    print(x -> String);\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "2\n");
}

#[test]
fn put_targets_the_global_scope_and_let_stays_local() {
    let run = run(concat!(
        "fun main() {\n",
        "    put shared = 41;\n",
        "    let local = 1;\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.engine.global_lookup("shared"), Some(Value::Integer(41)));
    assert_eq!(run.engine.global_lookup("local"), None);
}

#[test]
fn function_without_return_yields_void() {
    let run = run(concat!(
        "import { print, typeof } from std;\n",
        "fun f() { let x = 1; }\n",
        "fun main() {\n",
        "    if (typeof(f()) == Void) { print(\"nil\"); }\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "nil\n");
}

#[test]
fn first_return_fixes_the_inferred_return_type() {
    // First call returns an Integer, fixing the return type; the second call
    // takes the String path and fails the check.
    let source = concat!(
        "fun pick(flag: Boolean) {\n",
        "    if (flag) { return 1; }\n",
        "    return \"x\";\n",
        "}\n",
        "fun main() {\n",
        "    let first = pick(true);\n",
        "    let second = pick(false);\n",
        "}\n",
    );
    let run = run(source);
    assert_eq!(
        run.error_message(),
        "unexpected type 'String' (expected 'Integer')"
    );

    // Inference follows execution order, not source order: taking the String
    // path first fixes the type to String instead.
    let source = concat!(
        "fun pick(flag: Boolean) {\n",
        "    if (flag) { return 1; }\n",
        "    return \"x\";\n",
        "}\n",
        "fun main() {\n",
        "    let first = pick(false);\n",
        "    let second = pick(true);\n",
        "}\n",
    );
    let run = super::run(source);
    assert_eq!(
        run.error_message(),
        "unexpected type 'Integer' (expected 'String')"
    );
}

#[test]
fn declared_return_type_is_checked_on_every_return() {
    let run = run(concat!(
        "fun f(): Integer { return \"oops\"; }\n",
        "fun main() { let x = f(); }\n",
    ));
    assert_eq!(
        run.error_message(),
        "unexpected type 'String' (expected 'Integer')"
    );
}

#[test]
fn nil_coalesce_is_eager_on_both_sides() {
    let run = run(concat!(
        "import { print } from std;\n",
        "fun bump(): Integer {\n",
        "    put hits = 1;\n",
        "    return 10;\n",
        "}\n",
        "fun main() {\n",
        "    let kept = 5 ?? bump();\n",
        "    print(kept -> String);\n",
        "    let fallback = nil ?? bump();\n",
        "    print(fallback -> String);\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "5\n10\n");
    // The discarded operand still ran: bump's side effect is visible even
    // though its value was thrown away on the first coalesce.
    assert_eq!(run.engine.global_lookup("hits"), Some(Value::Integer(1)));
}

#[test]
fn cast_contract() {
    let run = run(concat!(
        "import { print } from std;\n",
        "fun main() {\n",
        "    let n = \"123\" -> Integer;\n",
        "    print(n -> String);\n",
        "    print(42 -> String);\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "123\n42\n");

    let failing = super::run("fun main() { let n = \"abc\" -> Integer; }\n");
    assert_eq!(failing.error_message(), "cannot cast 'abc' to 'Integer'");

    let failing = super::run("fun main() { let n = nil -> Integer; }\n");
    assert_eq!(failing.error_message(), "cannot cast 'Void' to 'Integer'");
}

#[test]
fn importing_a_missing_module_aborts_the_run() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let run = run_in(
        dir.path(),
        "import { helper } from ghost;\nfun main() {}\n",
        &[],
    );
    assert_eq!(run.error_message(), "module 'ghost' does not exist");
    assert_eq!(run.error().line(), Some(1));
}

#[test]
fn call_arity_is_checked_before_binding() {
    let source = concat!(
        "fun f(a: Integer, b: Integer) { return a + b; }\n",
        "fun main() { let x = f(1); }\n",
    );
    let run = run(source);
    assert_eq!(run.error_message(), "not enough arguments for function call");

    let source = concat!(
        "fun f(a: Integer, b: Integer) { return a + b; }\n",
        "fun main() { let x = f(1, 2, 3); }\n",
    );
    let run = super::run(source);
    assert_eq!(run.error_message(), "too many arguments for function call");
}

#[test]
fn parameter_types_are_checked_at_the_call_boundary() {
    let run = run(concat!(
        "fun f(a: Integer) { return a; }\n",
        "fun main() { let x = f(\"one\"); }\n",
    ));
    assert_eq!(
        run.error_message(),
        "unexpected type 'String' (expected 'Integer')"
    );
}

#[test]
fn declared_assignment_type_is_checked_outer_only() {
    let run = run("fun main() { let x: Integer = \"nope\"; }\n");
    assert_eq!(
        run.error_message(),
        "unexpected type 'String' (expected 'Integer')"
    );

    // Element type of a generic-looking annotation is unchecked.
    let run = super::run("fun main() { let xs: List[String] = [1, 2]; }\n");
    run.result.as_ref().expect("outer type check only");
}

#[test]
fn typeof_reports_type_objects() {
    let run = run(concat!(
        "import { print, typeof } from std;\n",
        "fun main() {\n",
        "    if (typeof(1) == Integer) { print(\"int\"); }\n",
        "    if (typeof(\"s\") == String) { print(\"str\"); }\n",
        "    if (typeof(nil) == Void) { print(\"void\"); }\n",
        "}\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "int\nstr\nvoid\n");
}

#[test]
fn print_requires_string_arguments() {
    let run = run(concat!(
        "import { print } from std;\n",
        "fun main() { print(7); }\n",
    ));
    assert_eq!(
        run.error_message(),
        "unexpected type 'Integer' (expected 'String')"
    );
    assert_eq!(run.error().line(), Some(2));
}

#[test]
fn entry_point_contract() {
    let missing = run("let x = 1;\n");
    assert!(matches!(missing.error(), RuntimeError::MissingEntryPoint));

    let not_a_function = run("let main = 3;\n");
    assert_eq!(
        not_a_function.error_message(),
        "entry point 'main' must be a function, found 'Integer'"
    );

    let too_wide = run("fun main(a: Integer, b: Integer) {}\n");
    assert_eq!(
        too_wide.error_message(),
        "entry point 'main' must accept zero or one parameter"
    );
}

#[test]
fn one_parameter_main_receives_the_argument_list() {
    let source = concat!(
        "import { print, typeof } from std;\n",
        "fun main(args: List) {\n",
        "    if (typeof(args) == List) { print(\"got args\"); }\n",
        "}\n",
    );
    let run = run_in(std::path::Path::new("."), source, &["alpha".to_string()]);
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "got args\n");
}

#[test]
fn inverted_arithmetic_tiers_are_observable() {
    // `1 + 2 * 3` groups as `(1 + 2) * 3` in this grammar.
    let run = run(concat!(
        "import { print } from std;\n",
        "fun main() { print(1 + 2 * 3 -> String); }\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "9\n");
}

#[test]
fn string_concatenation_through_the_primitive_plus() {
    let run = run(concat!(
        "import { print } from std;\n",
        "fun main() { print(\"foo\" + \"bar\"); }\n",
    ));
    run.result.as_ref().expect("run succeeds");
    assert_eq!(run.output(), "foobar\n");

    let failing = super::run("fun main() { let x = 1 + \"s\"; }\n");
    assert_eq!(
        failing.error_message(),
        "operator '+' not allowed between 'Integer' and 'String'"
    );
}

#[test]
fn type_tag_names_match_the_surface_syntax() {
    assert_eq!(TypeTag::Integer.name(), "Integer");
    assert_eq!(TypeTag::Void.name(), "Void");
    assert_eq!(Value::Void.to_string(), "nil");
}
