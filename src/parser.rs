//! Recursive-descent parser producing an AST from a token sequence.
//!
//! The grammar is intentionally minimal:
//!
//! ```text
//! primary  := NUMBER | VARIABLE | call
//! call     := FUNCTION "(" primary
//! ```
//!
//! Parsing starts at the first token and returns the node for the primary
//! expression found there. Function calls take exactly one argument. There is no
//! infix or precedence parsing, and tokens after the primary expression (including
//! the closing parenthesis of a call) are not inspected.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::lexer::{Token, TokenType};

/// Tag of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Number,
    Variable,
    Function,
}

/// A node of the expression tree.
///
/// The children of a function node live behind an [`Arc`], so cloning a node is a
/// shallow copy: the clone shares its child list with the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AstNode {
    /// A numeric literal
    Number {
        #[serde(
            serialize_with = "crate::serde_tools::serialize_f64",
            deserialize_with = "crate::serde_tools::deserialize_f64"
        )]
        value: f64,
        position: usize,
    },
    /// A reference to a variable by name
    Variable { value: String, position: usize },
    /// A call of a built-in function
    Function {
        value: String,
        children: Arc<Vec<AstNode>>,
        position: usize,
    },
}

impl AstNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AstNode::Number { .. } => NodeKind::Number,
            AstNode::Variable { .. } => NodeKind::Variable,
            AstNode::Function { .. } => NodeKind::Function,
        }
    }

    /// Source offset of the token that defined this node.
    pub fn position(&self) -> usize {
        match self {
            AstNode::Number { position, .. }
            | AstNode::Variable { position, .. }
            | AstNode::Function { position, .. } => *position,
        }
    }

    /// Child nodes; empty for leaves.
    pub fn children(&self) -> &[AstNode] {
        match self {
            AstNode::Function { children, .. } => children,
            _ => &[],
        }
    }

    /// Returns true if `other` shares this node's child list rather than owning a copy.
    pub fn shares_children_with(&self, other: &AstNode) -> bool {
        match (self, other) {
            (AstNode::Function { children: a, .. }, AstNode::Function { children: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Number { value, .. } => write!(f, "{value}"),
            AstNode::Variable { value, .. } => f.write_str(value),
            AstNode::Function {
                value, children, ..
            } => {
                write!(f, "{value}(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Parses `tokens` into an AST.
///
/// Returns `Ok(None)` if there are no tokens at all.
///
/// # Example
/// ```
/// use calcexpr::lexer::tokenize_str;
/// use calcexpr::parser::{parse_tokens, NodeKind};
///
/// let ast = parse_tokens(&tokenize_str("sqrt(x)")).unwrap().unwrap();
/// assert_eq!(ast.kind(), NodeKind::Function);
/// assert_eq!(ast.children()[0].to_string(), "x");
/// ```
pub fn parse_tokens(tokens: &[Token]) -> Result<Option<AstNode>, ParseError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    Parser { tokens }.parse_expression(0).map(Some)
}

struct Parser<'a> {
    tokens: &'a [Token],
}

impl Parser<'_> {
    fn token(&self, index: usize) -> Result<&Token, ParseError> {
        self.tokens
            .get(index)
            .ok_or(ParseError::UnexpectedEndOfInput)
    }

    fn parse_expression(&self, index: usize) -> Result<AstNode, ParseError> {
        let token = self.token(index)?;
        match token.token_type {
            TokenType::Number => Ok(AstNode::Number {
                value: leading_float(&token.value),
                position: token.position,
            }),
            TokenType::Variable => Ok(AstNode::Variable {
                value: token.value.clone(),
                position: token.position,
            }),
            TokenType::Function => self.parse_function_call(index),
            other => Err(ParseError::UnexpectedTokenType {
                token_type: other,
                value: token.value.clone(),
                position: token.position,
            }),
        }
    }

    fn parse_function_call(&self, index: usize) -> Result<AstNode, ParseError> {
        let function = self.token(index)?;
        let opens_call = self
            .tokens
            .get(index + 1)
            .is_some_and(|next| next.is_paren('('));
        if !opens_call {
            return Err(ParseError::MissingOpenParenAfterFunction {
                name: function.value.clone(),
                position: function.position,
            });
        }

        let argument = self.parse_expression(index + 2)?;
        Ok(AstNode::Function {
            value: function.value.clone(),
            children: Arc::new(vec![argument]),
            position: function.position,
        })
    }
}

/// Parses the longest prefix of `text` that forms a decimal number.
///
/// Number tokens are runs of digits and decimal points, so a run like `1.2.3`
/// reads as `1.2`.
fn leading_float(text: &str) -> f64 {
    let end = text
        .char_indices()
        .filter(|&(_, c)| c == '.')
        .nth(1)
        .map_or(text.len(), |(i, _)| i);
    let prefix = text[..end].trim_end_matches('.');
    prefix.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize_str;

    fn parse(input: &str) -> Result<Option<AstNode>, ParseError> {
        parse_tokens(&tokenize_str(input))
    }

    #[test]
    fn test_number() {
        assert_eq!(
            parse("12.5").unwrap(),
            Some(AstNode::Number {
                value: 12.5,
                position: 0
            })
        );
    }

    #[test]
    fn test_variable() {
        assert_eq!(
            parse("  x").unwrap(),
            Some(AstNode::Variable {
                value: "x".to_string(),
                position: 2
            })
        );
    }

    #[test]
    fn test_function_call() {
        let ast = parse("sin(30)").unwrap().unwrap();
        assert_eq!(ast.kind(), NodeKind::Function);
        assert_eq!(ast.position(), 0);
        assert_eq!(
            ast.children(),
            &[AstNode::Number {
                value: 30.0,
                position: 4
            }]
        );
        assert_eq!(ast.to_string(), "sin(30)");
    }

    #[test]
    fn test_nested_function_call() {
        let ast = parse("sqrt(abs(x))").unwrap().unwrap();
        assert_eq!(ast.to_string(), "sqrt(abs(x))");
        assert_eq!(ast.children()[0].kind(), NodeKind::Function);
    }

    #[test]
    fn test_missing_open_paren() {
        assert_eq!(
            parse("sin30"),
            Err(ParseError::MissingOpenParenAfterFunction {
                name: "sin".to_string(),
                position: 0
            })
        );
        assert!(matches!(
            parse("cos"),
            Err(ParseError::MissingOpenParenAfterFunction { .. })
        ));
    }

    #[test]
    fn test_unexpected_token_type() {
        assert!(matches!(
            parse("(1)"),
            Err(ParseError::UnexpectedTokenType {
                token_type: TokenType::Parenthesis,
                ..
            })
        ));
        assert!(matches!(
            parse("π"),
            Err(ParseError::UnexpectedTokenType {
                token_type: TokenType::Constant,
                ..
            })
        ));
        assert!(matches!(
            parse("sin()"),
            Err(ParseError::UnexpectedTokenType { position: 4, .. })
        ));
    }

    #[test]
    fn test_unexpected_end_of_input() {
        assert_eq!(parse("sin("), Err(ParseError::UnexpectedEndOfInput));
    }

    #[test]
    fn test_empty_token_sequence() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_trailing_tokens_are_ignored() {
        let ast = parse("x + 1").unwrap().unwrap();
        assert_eq!(ast.to_string(), "x");
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(leading_float("3"), 3.0);
        assert_eq!(leading_float("3."), 3.0);
        assert_eq!(leading_float("1.2.3"), 1.2);
        assert_eq!(leading_float("0.25"), 0.25);
    }

    #[test]
    fn test_clone_shares_children() {
        let ast = parse("ln(x)").unwrap().unwrap();
        let copy = ast.clone();
        assert!(copy.shares_children_with(&ast));
    }
}
