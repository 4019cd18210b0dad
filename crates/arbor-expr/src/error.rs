use thiserror::Error;

/// Compile- and run-time errors of the expression pipeline.
///
/// Construction errors (parse, type) are reported synchronously by
/// [`crate::compile`]; the lookup variants are produced when a compiled
/// closure runs against a context missing its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("wrong variable type: {0}")]
    WrongType(String),
    #[error("variable undefined: {0}")]
    Undefined(String),
    #[error("key not set: {0}")]
    KeyMiss(String),
    #[error("number ill format: {0}")]
    NumberFormat(String),
    #[error("ill func: {0}")]
    IllFunc(String),
}
