//! Expression front end and numeric performance layer for a calculator.
//!
//! This crate turns raw calculator input into a validated, tokenized and parsed
//! [`Expression`], and provides the caching and scheduling primitives an evaluator
//! uses to compute results quickly. It does not evaluate expressions itself.
//!
//! # Features
//!
//! - Fail-fast input validation (alphabet, length, parenthesis balance)
//! - Position-tracking lexer and a recursive-descent parser for function calls
//! - Expression lifecycle state, variable bindings and JSON round-tripping
//! - LRU memoization with optional TTL, batching, object pooling and timing metrics
//! - Memoized trigonometric, logarithmic and combinatorial primitives
//!
//! # Example
//!
//! ```rust
//! use calcexpr::Expression;
//!
//! let mut expr = Expression::new("sin(30)");
//! assert!(expr.is_valid());
//!
//! let ast = expr.parse().unwrap();
//! assert_eq!(ast.to_string(), "sin(30)");
//!
//! let json = expr.to_json().unwrap();
//! let restored = Expression::from_json(&json).unwrap();
//! assert_eq!(restored.input(), "sin(30)");
//! ```

pub use context::CalculationContext;
pub use expression::Expression;

pub mod prelude {
    pub use crate::context::{CalculationContext, ContextOptions};
    pub use crate::errors::{ExpressionError, NumericError, ParseError, ValidationError};
    pub use crate::expression::{Expression, ExpressionType, Phase};
    pub use crate::lexer::{tokenize_str, Token, TokenType};
    pub use crate::parser::{parse_tokens, AstNode, NodeKind};
    pub use crate::validate::validate_input;
}

/// Character classification for the input alphabet
pub mod chars;
/// Memoized numeric primitives shared by an evaluator
pub mod context;
/// Error types for the various failure modes
pub mod errors;
/// Expression lifecycle, variables and serialization
pub mod expression;
/// Conversion of input text into positioned tokens
pub mod lexer;
/// Recursive-descent parsing of tokens into an AST
pub mod parser;
/// Caching, batching, pooling and timing primitives
pub mod perf;
/// Serde helpers for non-finite numbers
pub mod serde_tools;
/// Fail-fast validation of raw input
pub mod validate;
/// Numeric functions backing the calculator's scientific keys
pub mod operators {
    pub mod combinatorics;

    pub use combinatorics::{combination, factorial, permutation};
}

#[cfg(test)]
mod proptests;
