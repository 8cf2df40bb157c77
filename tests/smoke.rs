// Violet smoke tests for the tokenizer and parser surface.
// Covers: assignments, functions, imports, control forms, and the statement
// shapes the runtime expects from the front end.

use violet::{
    ast::{self, BindingTarget, ImportList, StmtKind},
    parser,
    tokenizer,
};

fn tokenize_and_parse(source: &str) -> Result<ast::Program, Vec<parser::ParseError>> {
    let mut tokenizer = tokenizer::Tokenizer::new(source);
    let tokens = tokenizer.tokenize().unwrap();
    let mut parser = parser::Parser::new(tokens);
    parser.parse()
}

#[test]
fn test_arithmetic() {
    let program = tokenize_and_parse("1 + 2 * 3 - 4 / 2;").unwrap();
    assert!(format!("{:?}", program).contains("Binary"));
}

#[test]
fn test_variable_assignment() {
    let program = tokenize_and_parse("let x: Integer = 42;").unwrap();
    match &program.statements[0].kind {
        StmtKind::Assignment(decl) => {
            assert_eq!(decl.name, "x");
            assert!(!decl.constant);
            assert_eq!(decl.target, BindingTarget::Let);
            assert_eq!(
                decl.declared_type.as_ref().map(|ty| ty.name.as_str()),
                Some("Integer")
            );
        }
        other => panic!("expected assignment, found {other:?}"),
    }
}

#[test]
fn test_put_scoped_assignment() {
    let program = tokenize_and_parse("put shared = 1;").unwrap();
    match &program.statements[0].kind {
        StmtKind::Assignment(decl) => assert_eq!(decl.target, BindingTarget::Put),
        other => panic!("expected assignment, found {other:?}"),
    }
}

#[test]
fn test_const_declaration() {
    let program = tokenize_and_parse("let const LIMIT: Integer = 10;").unwrap();
    match &program.statements[0].kind {
        StmtKind::Assignment(decl) => {
            assert!(decl.constant);
            assert_eq!(decl.name, "LIMIT");
        }
        other => panic!("expected assignment, found {other:?}"),
    }
}

#[test]
fn test_function_definition() {
    let program =
        tokenize_and_parse("fun add(a: Integer, b: Integer): Integer { return a + b; }").unwrap();
    match &program.statements[0].kind {
        StmtKind::FunctionDef(decl) => {
            assert_eq!(decl.name, "add");
            assert_eq!(decl.params.len(), 2);
            assert_eq!(
                decl.return_type.as_ref().map(|ty| ty.name.as_str()),
                Some("Integer")
            );
        }
        other => panic!("expected function definition, found {other:?}"),
    }
}

#[test]
fn test_function_without_annotations() {
    let program = tokenize_and_parse("fun noop() {}").unwrap();
    match &program.statements[0].kind {
        StmtKind::FunctionDef(decl) => {
            assert!(decl.params.is_empty());
            assert!(decl.return_type.is_none());
            assert!(decl.body.is_empty());
        }
        other => panic!("expected function definition, found {other:?}"),
    }
}

#[test]
fn test_import_name_list() {
    let program = tokenize_and_parse("import { print, typeof } from std;").unwrap();
    match &program.statements[0].kind {
        StmtKind::Import(decl) => {
            assert!(decl.source.is_std());
            assert_eq!(
                decl.names,
                ImportList::Names(vec!["print".to_string(), "typeof".to_string()])
            );
        }
        other => panic!("expected import, found {other:?}"),
    }
}

#[test]
fn test_import_glob_from_dotted_path() {
    let program = tokenize_and_parse("import { * } from util.text;").unwrap();
    match &program.statements[0].kind {
        StmtKind::Import(decl) => {
            assert_eq!(decl.names, ImportList::Glob);
            assert_eq!(decl.source.dotted(), "util.text");
            assert!(!decl.source.is_std());
        }
        other => panic!("expected import, found {other:?}"),
    }
}

#[test]
fn test_if_elseif_else() {
    let source = "fun f(x: Integer) { if (x > 0) { return 1; } elseif (x < 0) { return 2; } else { return 3; } }";
    let program = tokenize_and_parse(source).unwrap();
    match &program.statements[0].kind {
        StmtKind::FunctionDef(decl) => match &decl.body[0].kind {
            StmtKind::If(chain) => {
                assert_eq!(chain.branches.len(), 2);
                assert!(chain.else_body.is_some());
            }
            other => panic!("expected if chain, found {other:?}"),
        },
        other => panic!("expected function definition, found {other:?}"),
    }
}

#[test]
fn test_for_statement_parses() {
    let program = tokenize_and_parse("fun f(xs: List) { for (x in xs) { x; } }").unwrap();
    match &program.statements[0].kind {
        StmtKind::FunctionDef(decl) => {
            assert!(matches!(decl.body[0].kind, StmtKind::For(_)));
        }
        other => panic!("expected function definition, found {other:?}"),
    }
}

#[test]
fn test_statement_lines_are_recorded() {
    let program = tokenize_and_parse("let a = 1;\nlet b = 2;\n\nlet c = 3;").unwrap();
    let lines: Vec<u32> = program.statements.iter().map(|stmt| stmt.line).collect();
    assert_eq!(lines, vec![1, 2, 4]);
}

#[test]
fn test_syntax_errors_are_a_list() {
    let errors = tokenize_and_parse("let 1 = x;\nlet ok = 2;\nput = 3;").unwrap_err();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].position().line, 1);
    assert_eq!(errors[1].position().line, 3);
}
