//! Lexer turning validated expression text into a flat token sequence.
//!
//! The lexer is a single left-to-right scan. At each position it classifies the
//! current character and consumes a maximal run:
//!
//! - whitespace is skipped without emitting a token
//! - a digit starts a `Number` run of digits and decimal points
//! - `+ - * / ^` emit a single-character `Operator`
//! - `(` and `)` emit a single-character `Parenthesis`
//! - a letter starts a run of letters, emitted as `Function` when the lowercase run
//!   is one of [`FUNCTIONS`] and as `Variable` otherwise
//! - `π` emits a `Constant`
//! - anything else emits a single-character `Unknown` token
//!
//! Lexing never fails: the validator has already restricted the alphabet, and any
//! character that still slips through is surfaced as `Unknown` for the parser to reject.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use serde::{Deserialize, Serialize};

use crate::chars::{
    is_constant, is_decimal_point, is_digit, is_letter, is_operator, is_parenthesis,
    is_whitespace,
};

/// Function names recognised by the lexer (compared in lowercase).
pub const FUNCTIONS: [&str; 7] = ["sin", "cos", "tan", "ln", "log", "sqrt", "abs"];

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Number,
    Operator,
    Function,
    Variable,
    Parenthesis,
    Constant,
    Unknown,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Number => "NUMBER",
            TokenType::Operator => "OPERATOR",
            TokenType::Function => "FUNCTION",
            TokenType::Variable => "VARIABLE",
            TokenType::Parenthesis => "PARENTHESIS",
            TokenType::Constant => "CONSTANT",
            TokenType::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A minimal lexical unit: its category, the exact text matched, and the byte
/// offset in the input where it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, position: usize) -> Self {
        Self {
            token_type,
            value: value.into(),
            position,
        }
    }

    /// Byte offset one past the last character of the token.
    pub fn end(&self) -> usize {
        self.position + self.value.len()
    }

    /// Returns true if this is the parenthesis token `paren`.
    pub fn is_paren(&self, paren: char) -> bool {
        self.token_type == TokenType::Parenthesis && self.value.starts_with(paren)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}@{}", self.token_type, self.value, self.position)
    }
}

/// Splits `input` into tokens.
///
/// # Example
/// ```
/// use calcexpr::lexer::{tokenize_str, Token, TokenType};
///
/// let tokens = tokenize_str("12.5+3");
/// assert_eq!(
///     tokens,
///     vec![
///         Token::new(TokenType::Number, "12.5", 0),
///         Token::new(TokenType::Operator, "+", 4),
///         Token::new(TokenType::Number, "3", 5),
///     ]
/// );
/// ```
pub fn tokenize_str(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if is_whitespace(c) {
            chars.next();
            continue;
        }

        let token = if is_digit(c) {
            let run = take_while(input, &mut chars, position, |c| {
                is_digit(c) || is_decimal_point(c)
            });
            Token::new(TokenType::Number, run, position)
        } else if is_letter(c) {
            let run = take_while(input, &mut chars, position, is_letter);
            let token_type = if is_function_name(run) {
                TokenType::Function
            } else {
                TokenType::Variable
            };
            Token::new(token_type, run, position)
        } else {
            chars.next();
            let token_type = if is_operator(c) {
                TokenType::Operator
            } else if is_parenthesis(c) {
                TokenType::Parenthesis
            } else if is_constant(c) {
                TokenType::Constant
            } else {
                TokenType::Unknown
            };
            Token::new(token_type, &input[position..position + c.len_utf8()], position)
        };
        tokens.push(token);
    }

    tokens
}

/// Returns true if `name` (in any case) is one of the built-in functions.
pub fn is_function_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    FUNCTIONS.contains(&lower.as_str())
}

/// Consumes the maximal run of characters matching `pred` and returns it as a slice
/// of `input` starting at `start`.
fn take_while<'a>(
    input: &'a str,
    chars: &mut Peekable<CharIndices<'a>>,
    start: usize,
    pred: impl Fn(char) -> bool,
) -> &'a str {
    let mut end = start;
    while let Some(&(i, c)) = chars.peek() {
        if !pred(c) {
            break;
        }
        end = i + c.len_utf8();
        chars.next();
    }
    &input[start..end]
}
