// Run each demo fixture end to end and pin its transcript. These are the
// same files the CLI `--test` sweep covers.

use crate::runtime::run_file;

#[test]
fn hello_demo() {
    let output = run_file("demos/hello.vi").expect("run demo");
    assert_eq!(output.stdout, "hello from violet\n");
}

#[test]
fn arithmetic_demo() {
    let output = run_file("demos/arithmetic.vi").expect("run demo");
    assert_eq!(output.stdout, "42\neven\n10\n");
}

#[test]
fn casts_demo() {
    let output = run_file("demos/casts.vi").expect("run demo");
    assert_eq!(output.stdout, "123\nnon-empty\nparsed as Integer\n");
}

#[test]
fn scopes_demo() {
    let output = run_file("demos/scopes.vi").expect("run demo");
    assert_eq!(output.stdout, "hi\nwritten from a nested scope\n");
}

#[test]
fn control_flow_demo() {
    let output = run_file("demos/control_flow.vi").expect("run demo");
    assert_eq!(output.stdout, "small\nmedium\nlarge\ntop\n3\n");
}

#[test]
fn greeting_demo_runs_standalone() {
    let output = run_file("demos/greeting.vi").expect("run demo");
    assert_eq!(output.stdout, "greetings, local run\n");
}

#[test]
fn run_source_defaults_to_the_working_directory() {
    let output = crate::runtime::run_source(
        "import { print } from std;\nfun main() { print(\"inline\"); }\n",
    )
    .expect("run source");
    assert_eq!(output.stdout, "inline\n");
}

#[test]
fn imports_demo_pulls_in_the_greeting_module() {
    let output = run_file("demos/imports.vi").expect("run demo");
    assert_eq!(output.stdout, "greetings, importer\n-- greeting module\n");
}
