//! The `Expression` type: one calculator expression and its lifecycle.
//!
//! An expression is validated synchronously when it is constructed and is then
//! advanced through lexing and parsing by its own methods. Validation and parse
//! failures never escape as errors: they are absorbed into the expression's state
//! (`is_valid` / `error_message`) so that an invalid expression is simply inert.
//!
//! # Lifecycle
//!
//! ```text
//! created -> valid | invalid            (constructor, validation)
//!         -> parsing                    (start of tokenize)
//!         -> valid | invalid            (end of parse)
//! ```
//!
//! The `evaluating`, `completed` and `error` phases exist for an external evaluator
//! and are never entered by this crate.
//!
//! # Example
//!
//! ```
//! use calcexpr::expression::{Expression, Phase};
//!
//! let mut expr = Expression::new("sin(30)");
//! assert!(expr.is_valid());
//!
//! let ast = expr.parse().unwrap();
//! assert_eq!(ast.to_string(), "sin(30)");
//! assert_eq!(expr.state().phase, Phase::Valid);
//! assert_eq!(expr.state().metadata.token_count, 4);
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use colored::Colorize;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ExpressionError;
use crate::lexer::{tokenize_str, Token};
use crate::parser::{parse_tokens, AstNode};
use crate::validate::validate_input;

/// Kind of calculation an expression belongs to. Informational only at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionType {
    #[default]
    Arithmetic,
    Scientific,
    Matrix,
    Geometry,
    Equation,
    Logic,
    Function,
}

/// Lifecycle phase of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Created,
    Parsing,
    Valid,
    Invalid,
    /// Reserved for an external evaluator
    Evaluating,
    /// Reserved for an external evaluator
    Completed,
    /// Reserved for an external evaluator
    Error,
}

/// Snapshot taken at every phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMetadata {
    pub token_count: usize,
    pub has_variables: bool,
}

/// Current lifecycle state. Replaced wholesale on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionState {
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    pub metadata: StateMetadata,
}

impl Default for ExpressionState {
    fn default() -> Self {
        Self {
            phase: Phase::Created,
            timestamp: Utc::now(),
            metadata: StateMetadata::default(),
        }
    }
}

/// A single calculator expression.
///
/// Invariants:
/// - `is_valid == false` implies `error_message.is_some()`
/// - `tokens` is empty until [`Expression::tokenize`] runs
/// - `ast` is `None` until [`Expression::parse`] succeeds
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    id: String,
    input: String,
    tokens: Vec<Token>,
    ast: Option<AstNode>,
    is_valid: bool,
    error_message: Option<String>,
    #[serde(rename = "type")]
    expression_type: ExpressionType,
    created_at: DateTime<Utc>,
    #[serde(
        serialize_with = "crate::serde_tools::serialize_f64_map",
        deserialize_with = "crate::serde_tools::deserialize_f64_map"
    )]
    variables: HashMap<String, f64>,
    #[serde(skip)]
    state: ExpressionState,
}

impl Expression {
    /// Creates and validates an arithmetic expression with a fresh id.
    pub fn new(input: &str) -> Self {
        Self::with_type(input, ExpressionType::default())
    }

    /// Creates and validates an expression of the given type with a fresh id.
    pub fn with_type(input: &str, expression_type: ExpressionType) -> Self {
        Self::with_id(input, expression_type, Uuid::new_v4().to_string())
    }

    /// Creates and validates an expression with an explicit id.
    pub fn with_id(input: &str, expression_type: ExpressionType, id: impl Into<String>) -> Self {
        let mut expr = Self {
            id: id.into(),
            input: input.trim().to_string(),
            tokens: Vec::new(),
            ast: None,
            is_valid: false,
            error_message: None,
            expression_type,
            created_at: Utc::now(),
            variables: HashMap::new(),
            state: ExpressionState::default(),
        };
        expr.validate();
        expr
    }

    fn validate(&mut self) {
        match validate_input(&self.input) {
            Ok(()) => {
                self.is_valid = true;
                self.error_message = None;
                self.transition(Phase::Valid);
            }
            Err(error) => self.invalidate(error.to_string()),
        }
    }

    fn invalidate(&mut self, message: String) {
        self.is_valid = false;
        self.error_message = Some(message);
        self.transition(Phase::Invalid);
    }

    fn transition(&mut self, phase: Phase) {
        self.state = ExpressionState {
            phase,
            timestamp: Utc::now(),
            metadata: StateMetadata {
                token_count: self.tokens.len(),
                has_variables: !self.variables.is_empty(),
            },
        };
    }

    /// Lexes the input, replacing any previous tokens.
    ///
    /// # Errors
    /// Returns `ExpressionError::TokenizeOnInvalidExpression` if the expression
    /// did not pass validation.
    pub fn tokenize(&mut self) -> Result<&[Token], ExpressionError> {
        if !self.is_valid {
            return Err(ExpressionError::TokenizeOnInvalidExpression);
        }
        self.transition(Phase::Parsing);
        self.tokens = tokenize_str(&self.input);
        Ok(&self.tokens)
    }

    /// Builds the AST, lexing first if no tokens exist yet.
    ///
    /// Returns `None` if the expression is invalid, has no tokens, or fails to
    /// parse. A parse failure marks the expression invalid and records the
    /// failure in `error_message`.
    pub fn parse(&mut self) -> Option<&AstNode> {
        if !self.is_valid {
            return None;
        }
        if self.tokens.is_empty() && self.tokenize().is_err() {
            return None;
        }
        if self.tokens.is_empty() {
            return None;
        }

        match parse_tokens(&self.tokens) {
            Ok(ast) => {
                self.ast = ast;
                self.transition(Phase::Valid);
                self.ast.as_ref()
            }
            Err(error) => {
                self.ast = None;
                self.invalidate(error.to_string());
                None
            }
        }
    }

    /// Binds `name` to `value`, overwriting any previous binding.
    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    /// Returns the value bound to `name`, if any.
    pub fn get_variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    pub fn variables(&self) -> &HashMap<String, f64> {
        &self.variables
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The trimmed source text.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn ast(&self) -> Option<&AstNode> {
        self.ast.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn expression_type(&self) -> ExpressionType {
        self.expression_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &ExpressionState {
        &self.state
    }

    /// Serializes every field except the transient lifecycle state.
    pub fn to_json(&self) -> Result<String, ExpressionError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores an expression from a [`Expression::to_json`] record.
    ///
    /// The lifecycle state is rebuilt from the restored validity flag.
    pub fn from_json(json: &str) -> Result<Self, ExpressionError> {
        let mut expr: Expression = serde_json::from_str(json)?;
        let phase = if expr.is_valid {
            Phase::Valid
        } else {
            Phase::Invalid
        };
        expr.transition(phase);
        Ok(expr)
    }
}

/// Produces a new expression (fresh id and creation time) over the same input and
/// type. Tokens are duplicated, the top-level AST node is copied while its
/// children stay shared with the original, the validity flags are carried over,
/// and the variable bindings are copied into an independent map.
impl Clone for Expression {
    fn clone(&self) -> Self {
        let mut copy = Self::with_type(&self.input, self.expression_type);
        copy.tokens = self.tokens.clone();
        copy.ast = self.ast.clone();
        copy.is_valid = self.is_valid;
        copy.error_message = self.error_message.clone();
        copy.variables = self.variables.clone();
        copy.transition(self.state.phase);
        copy
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "    {}: {}", "Expression".cyan(), self.input)?;
        writeln!(f, "    {}: {:?}", "Type".cyan(), self.expression_type)?;
        writeln!(f, "    {}: {:?}", "Phase".cyan(), self.state.phase)?;
        match &self.error_message {
            Some(message) => writeln!(f, "    {}: {}", "Error".red(), message)?,
            None => writeln!(f, "    {}: {}", "Valid".cyan(), self.is_valid)?,
        }
        if !self.tokens.is_empty() {
            writeln!(
                f,
                "    {}: [{}]",
                "Tokens".cyan(),
                self.tokens.iter().join(", ")
            )?;
        }
        if let Some(ast) = &self.ast {
            writeln!(f, "    {}: {}", "AST".cyan(), ast)?;
        }
        if !self.variables.is_empty() {
            let bindings = self
                .variables
                .iter()
                .sorted_by(|a, b| a.0.cmp(b.0))
                .map(|(name, value)| format!("{name} = {value}"))
                .join(", ");
            writeln!(f, "    {}: {}", "Variables".cyan(), bindings)?;
        }
        write!(f, "}}")
    }
}
