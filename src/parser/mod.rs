//=============================================
// violet/parser.rs
//=============================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Violet recursive descent parser implementation
// Objective: Transform token streams into AST nodes consumed by the interpreter
//=============================================

use crate::ast::{
    AssignmentStmt, BinaryOp, BindingTarget, Expr, ExprKind, ForStmt, FunctionDecl, IfBranch,
    IfChain, ImportDecl, ImportList, Literal, ModulePath, Parameter, Program, Stmt, StmtKind,
    TypeName,
};
use crate::tokenizer::{Position, Token, TokenKind};
use thiserror::Error;

//=============================================
//            Section 1: Parse Errors
//=============================================

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },
    #[error("unexpected end of input (expected {expected})")]
    UnexpectedEndOfInput { expected: String, position: Position },
    #[error("invalid syntax: {message}")]
    InvalidSyntax { message: String, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEndOfInput { position, .. }
            | ParseError::InvalidSyntax { position, .. } => *position,
        }
    }
}

//=============================================
//            Section 2: Parser State
//=============================================

const MAX_EXPRESSION_DEPTH: usize = 2048;

/// Recursive descent parser for violet.
///
/// Syntax errors do not abort the parse: the parser records the error,
/// resynchronizes at the next statement boundary, and keeps going, so a
/// single run reports every malformed statement with its line.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
    expr_depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The tokenizer always terminates the stream; guard against callers
        // handing over a bare vector.
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                position: Position::new(1, 1),
            });
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            expr_depth: 0,
        }
    }

    /// Parse a complete program, collecting every syntax error encountered.
    pub fn parse(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            let before = self.current;
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                    // A stray token the resynchronizer refuses to consume
                    // (e.g. an unmatched '}') must not stall the parse.
                    if self.current == before {
                        self.advance();
                    }
                }
            }
        }
        if self.errors.is_empty() {
            Ok(Program::new(statements))
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    //=============================================
    //            Section 3: Token Navigation
    //=============================================

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(expected))
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<(String, Position), ParseError> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            let position = self.peek().position;
            self.advance();
            return Ok((name, position));
        }
        Err(self.unexpected(expected))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            ParseError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                position: token.position,
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.describe(),
                position: token.position,
            }
        }
    }

    fn line(&self) -> u32 {
        self.peek().position.line
    }

    /// Skip ahead to the next plausible statement start after a syntax error.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(self.peek().kind, TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if matches!(self.peek().kind, TokenKind::RBrace) {
                return;
            }
            if matches!(
                self.peek().kind,
                TokenKind::Import
                    | TokenKind::Let
                    | TokenKind::Put
                    | TokenKind::Fun
                    | TokenKind::Return
                    | TokenKind::Break
                    | TokenKind::Continue
                    | TokenKind::If
                    | TokenKind::For
            ) {
                return;
            }
            self.advance();
        }
    }

    //=============================================
    //            Section 4: Statement Parsing
    //=============================================

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        match &self.peek().kind {
            TokenKind::Import => self.parse_import(line),
            TokenKind::Let => self.parse_assignment(line, BindingTarget::Let),
            TokenKind::Put => self.parse_assignment(line, BindingTarget::Put),
            TokenKind::Fun => self.parse_function(line),
            TokenKind::Return => self.parse_return(line),
            TokenKind::Break => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';' after 'break'")?;
                Ok(Stmt {
                    kind: StmtKind::Break,
                    line,
                })
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';' after 'continue'")?;
                Ok(Stmt {
                    kind: StmtKind::Continue,
                    line,
                })
            }
            TokenKind::If => self.parse_if_chain(line),
            TokenKind::For => self.parse_for(line),
            TokenKind::Identifier(_) if matches!(self.peek_next().kind, TokenKind::Equals) => {
                let (name, _) = self.expect_identifier("identifier")?;
                self.advance(); // '='
                let value = self.parse_expression()?;
                self.expect(&TokenKind::Semicolon, "';' after reassignment")?;
                Ok(Stmt {
                    kind: StmtKind::Reassignment { name, value },
                    line,
                })
            }
            _ => {
                let expression = self.parse_expression()?;
                self.expect(&TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt {
                    kind: StmtKind::Expression(expression),
                    line,
                })
            }
        }
    }

    fn parse_import(&mut self, line: u32) -> Result<Stmt, ParseError> {
        self.advance(); // 'import'
        self.expect(&TokenKind::LBrace, "'{' after 'import'")?;

        let names = if self.eat(&TokenKind::Star) {
            ImportList::Glob
        } else {
            let mut names = Vec::new();
            loop {
                let (name, _) = self.expect_identifier("imported name")?;
                names.push(name);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            ImportList::Names(names)
        };

        self.expect(&TokenKind::RBrace, "'}' after import list")?;
        self.expect(&TokenKind::From, "'from'")?;
        let source = self.parse_module_path()?;
        self.expect(&TokenKind::Semicolon, "';' after import")?;

        Ok(Stmt {
            kind: StmtKind::Import(ImportDecl { names, source }),
            line,
        })
    }

    fn parse_module_path(&mut self) -> Result<ModulePath, ParseError> {
        let mut segments = Vec::new();
        let (first, _) = self.expect_identifier("module path")?;
        segments.push(first);
        while self.eat(&TokenKind::Dot) {
            let (segment, _) = self.expect_identifier("module path segment")?;
            segments.push(segment);
        }
        Ok(ModulePath { segments })
    }

    fn parse_assignment(&mut self, line: u32, target: BindingTarget) -> Result<Stmt, ParseError> {
        self.advance(); // 'let' | 'put'
        let constant = self.eat(&TokenKind::Const);
        let (name, _) = self.expect_identifier("binding name")?;
        let declared_type = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_name()?)
        } else {
            None
        };
        self.expect(&TokenKind::Equals, "'=' in assignment")?;
        let value = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "';' after assignment")?;

        Ok(Stmt {
            kind: StmtKind::Assignment(AssignmentStmt {
                target,
                constant,
                name,
                declared_type,
                value,
            }),
            line,
        })
    }

    fn parse_type_name(&mut self) -> Result<TypeName, ParseError> {
        let (name, position) = self.expect_identifier("type name")?;
        let element = if self.eat(&TokenKind::LBracket) {
            let (element, _) = self.expect_identifier("element type name")?;
            self.expect(&TokenKind::RBracket, "']' after element type")?;
            Some(element)
        } else {
            None
        };
        Ok(TypeName {
            name,
            element,
            line: position.line,
        })
    }

    fn parse_function(&mut self, line: u32) -> Result<Stmt, ParseError> {
        self.advance(); // 'fun'
        let (name, _) = self.expect_identifier("function name")?;
        self.expect(&TokenKind::LParen, "'(' after function name")?;
        let params = if self.check(&TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_parameter_list()?
        };
        self.expect(&TokenKind::RParen, "')' after parameters")?;
        let return_type = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_name()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::FunctionDef(FunctionDecl {
                name,
                params,
                return_type,
                body,
            }),
            line,
        })
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();
        loop {
            let (name, _) = self.expect_identifier("parameter name")?;
            self.expect(&TokenKind::Colon, "':' after parameter name")?;
            let declared_type = self.parse_type_name()?;
            let default = if self.eat(&TokenKind::Equals) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            params.push(Parameter {
                name,
                declared_type,
                default,
            });
            if !self.eat(&TokenKind::Comma) {
                return Ok(params);
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected("'}'"));
            }
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }
        self.advance(); // '}'
        Ok(statements)
    }

    fn parse_return(&mut self, line: u32) -> Result<Stmt, ParseError> {
        self.advance(); // 'return'
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "';' after return")?;
        Ok(Stmt {
            kind: StmtKind::Return(value),
            line,
        })
    }

    fn parse_if_chain(&mut self, line: u32) -> Result<Stmt, ParseError> {
        self.advance(); // 'if'
        let mut branches = vec![self.parse_condition_branch()?];
        while self.check(&TokenKind::Elseif) {
            self.advance();
            branches.push(self.parse_condition_branch()?);
        }
        let else_body = if self.eat(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If(IfChain { branches, else_body }),
            line,
        })
    }

    fn parse_condition_branch(&mut self) -> Result<IfBranch, ParseError> {
        self.expect(&TokenKind::LParen, "'(' before condition")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')' after condition")?;
        let body = self.parse_block()?;
        Ok(IfBranch { condition, body })
    }

    fn parse_for(&mut self, line: u32) -> Result<Stmt, ParseError> {
        self.advance(); // 'for'
        self.expect(&TokenKind::LParen, "'(' after 'for'")?;
        let (binding, _) = self.expect_identifier("loop binding")?;
        self.expect(&TokenKind::In, "'in'")?;
        let iterable = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')' after loop header")?;
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::For(ForStmt {
                binding,
                iterable,
                body,
            }),
            line,
        })
    }

    //=============================================
    //            Section 5: Expression Parsing
    //=============================================
    // Precedence, loosest to tightest, reproduces the original grammar:
    // ternary; comparison/range/lambda (nonassoc); cast; nil-coalesce;
    // modulus; multiplicative; additive; postfix. Note that '+'/'-' bind
    // tighter than '*'/'/' and '%' looser than both.

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPRESSION_DEPTH {
            self.expr_depth -= 1;
            return Err(ParseError::InvalidSyntax {
                message: "expression too deeply nested".to_string(),
                position: self.peek().position,
            });
        }
        let result = self.parse_ternary();
        self.expr_depth -= 1;
        result
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        if let Some(lambda) = self.try_parse_lambda()? {
            return Ok(lambda);
        }
        let line = self.line();
        let condition = self.parse_comparison()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }
        let when_true = self.parse_comparison()?;
        self.expect(&TokenKind::Colon, "':' in ternary expression")?;
        let when_false = self.parse_ternary()?;
        Ok(Expr {
            kind: ExprKind::Ternary {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            },
            line,
        })
    }

    /// Attempt `param_list => expr`; rewinds and returns `None` when the
    /// lookahead is not a lambda head.
    fn try_parse_lambda(&mut self) -> Result<Option<Expr>, ParseError> {
        if !matches!(self.peek().kind, TokenKind::Identifier(_))
            || !matches!(self.peek_next().kind, TokenKind::Colon)
        {
            return Ok(None);
        }
        let checkpoint = self.current;
        let line = self.line();
        let params = match self.parse_parameter_list() {
            Ok(params) => params,
            Err(_) => {
                self.current = checkpoint;
                return Ok(None);
            }
        };
        if !self.eat(&TokenKind::FatArrow) {
            self.current = checkpoint;
            return Ok(None);
        }
        let body = self.parse_expression()?;
        Ok(Some(Expr {
            kind: ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            line,
        }))
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let lhs = self.parse_cast()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => BinaryOp::Equal,
            TokenKind::NotEq => BinaryOp::NotEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEq => BinaryOp::GreaterEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEq => BinaryOp::LessEqual,
            TokenKind::DotDot => BinaryOp::Range,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_cast()?;
        Ok(Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            line,
        })
    }

    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let mut expr = self.parse_coalesce()?;
        while self.eat(&TokenKind::Arrow) {
            let target = self.parse_type_name()?;
            expr = Expr {
                kind: ExprKind::Cast {
                    value: Box::new(expr),
                    target,
                },
                line,
            };
        }
        Ok(expr)
    }

    fn parse_coalesce(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let mut expr = self.parse_modulo()?;
        while self.eat(&TokenKind::DoubleQuestion) {
            let rhs = self.parse_modulo()?;
            expr = Expr {
                kind: ExprKind::NilCoalesce {
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                line,
            };
        }
        Ok(expr)
    }

    fn parse_modulo(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let mut expr = self.parse_multiplicative()?;
        while self.check(&TokenKind::Percent) {
            self.advance();
            let rhs = self.parse_multiplicative()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::Modulo,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                line,
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                line,
            };
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let mut expr = self.parse_postfix()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_postfix()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                line,
            };
        }
    }

    /// Attribute chains and calls apply to identifiers only, per the grammar:
    /// `identity := name | identity '.' name`, `call := identity '(' args ')'`.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_primary()?;
        if !matches!(expr.kind, ExprKind::Identifier(_)) {
            return Ok(expr);
        }
        let line = expr.line;
        let mut expr = expr;
        while self.eat(&TokenKind::Dot) {
            let (name, _) = self.expect_identifier("attribute name")?;
            expr = Expr {
                kind: ExprKind::Attribute {
                    object: Box::new(expr),
                    name,
                },
                line,
            };
        }
        if self.eat(&TokenKind::LParen) {
            let mut args = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    args.push(self.parse_expression()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen, "')' after arguments")?;
            expr = Expr {
                kind: ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                },
                line,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let kind = match &self.peek().kind {
            TokenKind::Integer(value) => {
                let value = *value;
                self.advance();
                ExprKind::Literal(Literal::Integer(value))
            }
            TokenKind::Str(text) => {
                let text = text.clone();
                self.advance();
                ExprKind::Literal(Literal::Str(text))
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Literal(Literal::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Literal(Literal::Boolean(false))
            }
            TokenKind::Nil => {
                self.advance();
                ExprKind::Literal(Literal::Nil)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RBracket, "']' after list literal")?;
                ExprKind::ListLiteral(elements)
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                ExprKind::Identifier(name)
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Expr { kind, line })
    }
}
