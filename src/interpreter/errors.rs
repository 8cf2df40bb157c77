use thiserror::Error;

use super::value::Value;
use crate::modules::ModuleError;
use crate::parser::ParseError;
use crate::tokenizer::TokenizeError;

/// Result of executing one statement: either fall through to the next
/// statement or unwind with a control-flow exit signal. Exit signals are not
/// errors and pass through statement wrapping untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Exit(ExitSignal),
}

/// A non-error control transfer unwinding to its nearest consumer: the call
/// protocol consumes `Return`; nothing in this language version consumes
/// `Break`/`Continue`, so they surface as statement diagnostics at the
/// nearest boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ExitSignal {
    Return(Value),
    Break,
    Continue,
}

impl ExitSignal {
    pub fn keyword(&self) -> &'static str {
        match self {
            ExitSignal::Return(_) => "return",
            ExitSignal::Break => "break",
            ExitSignal::Continue => "continue",
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("operator '{operator}' not applicable on '{operand}'")]
    OperatorNotApplicable {
        operator: &'static str,
        operand: &'static str,
    },
    #[error("operator '{operator}' not allowed between '{lhs}' and '{rhs}'")]
    OperatorMismatch {
        operator: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("unexpected type '{found}' (expected '{expected}')")]
    TypeMismatch {
        found: &'static str,
        expected: &'static str,
    },
    #[error("cannot cast '{text}' to 'Integer'")]
    MalformedCastLiteral { text: String },
    #[error("cannot cast '{from}' to '{to}'")]
    CastNotSupported {
        from: &'static str,
        to: &'static str,
    },
    #[error("integer overflow in operator '{operator}'")]
    IntegerOverflow { operator: &'static str },
    #[error("division by zero")]
    DivisionByZero,
    #[error("variable '{0}' is not defined")]
    VariableNotFound(String),
    #[error("constant variable '{0}' cannot be reassigned")]
    ConstReassignment(String),
    #[error("{subject} has no attribute '{attribute}'")]
    NoAttribute { subject: String, attribute: String },
    #[error("not enough arguments for function call")]
    NotEnoughArguments,
    #[error("too many arguments for function call")]
    TooManyArguments,
    #[error("{0}")]
    Argument(String),
    #[error("cannot infer the element type of an empty list")]
    EmptyListLiteral,
    #[error("multi-typed lists are invalid (found '{found}', expected '{expected}')")]
    MixedListLiteral {
        found: &'static str,
        expected: &'static str,
    },
    #[error("unexpected {statement} statement in {context}")]
    UnexpectedStatement {
        context: &'static str,
        statement: &'static str,
    },
    #[error("'{signal}' outside of a loop")]
    StrayExit { signal: &'static str },
    #[error("missing entry point function 'main'")]
    MissingEntryPoint,
    #[error("{0}")]
    EntryPoint(String),
    #[error(transparent)]
    Import(#[from] ModuleError),
    /// Engine-internal invariant violation. Never statement-wrapped, always
    /// fatal, exits with its own code.
    #[error("{0}")]
    Panic(String),
    /// A failure wrapped with the innermost failing statement's line.
    #[error("{source}")]
    At {
        line: u32,
        #[source]
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    /// Wrap with the failing statement's line. Wrapping happens once, at the
    /// innermost statement; panics are never wrapped.
    pub fn at_line(self, line: u32) -> RuntimeError {
        match self {
            RuntimeError::At { .. } | RuntimeError::Panic(_) => self,
            other => RuntimeError::At {
                line,
                source: Box::new(other),
            },
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            RuntimeError::At { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, RuntimeError::Panic(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax,
    ModuleResolution,
    TypeMismatch,
    InvalidOperation,
    RuntimePanic,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Syntax => "E001",
            ErrorCode::ModuleResolution => "E002",
            ErrorCode::TypeMismatch => "E003",
            ErrorCode::InvalidOperation => "E004",
            ErrorCode::RuntimePanic => "E005",
        }
    }

    /// Process exit code for a failure of this class: user-level errors exit
    /// with 1, engine panics with their own distinct code.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::RuntimePanic => 9,
            _ => 1,
        }
    }
}

/// User-facing diagnostic: error class, originating line when one is known,
/// and the rendered message.
#[derive(Debug, Clone)]
pub struct ScriptError {
    pub code: ErrorCode,
    pub line: Option<u32>,
    pub message: String,
}

impl ScriptError {
    pub fn new(code: ErrorCode, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            code,
            line,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl From<TokenizeError> for ScriptError {
    fn from(value: TokenizeError) -> Self {
        ScriptError::new(
            ErrorCode::Syntax,
            Some(value.position().line),
            value.to_string(),
        )
    }
}

impl From<ParseError> for ScriptError {
    fn from(value: ParseError) -> Self {
        ScriptError::new(
            ErrorCode::Syntax,
            Some(value.position().line),
            value.to_string(),
        )
    }
}

impl From<ModuleError> for ScriptError {
    fn from(value: ModuleError) -> Self {
        ScriptError::new(ErrorCode::ModuleResolution, None, value.to_string())
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(value: RuntimeError) -> Self {
        ScriptError::new(
            runtime_error_code(&value),
            value.line(),
            value.to_string(),
        )
    }
}

pub fn runtime_error_code(error: &RuntimeError) -> ErrorCode {
    match error {
        RuntimeError::TypeMismatch { .. }
        | RuntimeError::MalformedCastLiteral { .. }
        | RuntimeError::CastNotSupported { .. }
        | RuntimeError::EmptyListLiteral
        | RuntimeError::MixedListLiteral { .. } => ErrorCode::TypeMismatch,
        RuntimeError::Import(_) => ErrorCode::ModuleResolution,
        RuntimeError::Panic(_) => ErrorCode::RuntimePanic,
        RuntimeError::At { source, .. } => runtime_error_code(source),
        _ => ErrorCode::InvalidOperation,
    }
}
