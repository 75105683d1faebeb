//! Error types for the calcexpr crate.
//!
//! This module defines the error types that can occur while validating, lexing and
//! parsing expressions, and while computing numeric primitives. The main error types are:
//!
//! - `ValidationError`: Structural problems detected before lexing (fail-fast)
//! - `ParseError`: Problems detected by the recursive-descent parser
//! - `NumericError`: Domain violations raised by the numeric primitives
//! - `ExpressionError`: Umbrella error returned by `Expression` operations
//!
//! Validation and parse errors are normally absorbed into the expression's own state
//! (`is_valid` / `error_message`); only numeric errors are surfaced to callers directly.

use thiserror::Error;

use crate::lexer::TokenType;

/// Errors produced by the validator, in the order its rules run.
///
/// The display text of each variant is what ends up in `Expression::error_message`,
/// so it is written for direct display to a user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The trimmed input has no characters
    #[error("expression must not be empty")]
    EmptyInput,
    /// The input is longer than the validator's maximum length
    #[error("expression exceeds maximum length")]
    InputTooLong,
    /// The input contains a character outside the calculator alphabet
    #[error("expression contains invalid characters")]
    InvalidCharacter,
    /// A closing parenthesis has no opening match, or an opening one is never closed
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,
}

/// Errors that can occur while building an AST from a token sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The parser needed a token past the end of the sequence
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// A token that cannot start a primary expression
    #[error("unexpected token type {token_type} '{value}' at position {position}")]
    UnexpectedTokenType {
        token_type: TokenType,
        value: String,
        position: usize,
    },
    /// A function name that is not immediately followed by `(`
    #[error("function call missing opening parenthesis after '{name}'")]
    MissingOpenParenAfterFunction { name: String, position: usize },
}

/// Domain errors raised by the numeric primitives in [`crate::operators`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    /// Factorial is only defined for non-negative integers
    #[error("factorial is not defined for negative input: {0}")]
    NegativeFactorialInput(i64),
}

/// High-level errors returned by `Expression` operations.
///
/// This wraps the lower-level validation and parse errors together with the
/// failure modes specific to the expression lifecycle and its serialized form.
#[derive(Error, Debug)]
pub enum ExpressionError {
    /// The expression failed one of the validation rules
    #[error("invalid expression: {0}")]
    Validation(#[from] ValidationError),
    /// `tokenize` was called on an expression that did not pass validation
    #[error("cannot tokenize an invalid expression")]
    TokenizeOnInvalidExpression,
    /// The token sequence could not be parsed
    #[error("failed to parse expression: {0}")]
    Parse(#[from] ParseError),
    /// The JSON record could not be produced or read back
    #[error("failed to (de)serialize expression")]
    Serialization(#[from] serde_json::Error),
}
