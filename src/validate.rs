//! Fail-fast structural validation of raw expression text.
//!
//! The rules run in a fixed order and validation stops at the first failing rule:
//!
//! 1. the input is not empty
//! 2. the input has at most [`MAX_LENGTH`] characters
//! 3. every character belongs to the calculator alphabet
//! 4. parentheses are balanced

use crate::chars::is_allowed;
use crate::errors::ValidationError;

/// Maximum number of characters accepted in one expression.
pub const MAX_LENGTH: usize = 1000;

type Rule = fn(&str) -> Result<(), ValidationError>;

const RULES: [Rule; 4] = [not_empty, within_length, allowed_alphabet, balanced_parentheses];

/// Runs every validation rule against `input`, stopping at the first failure.
///
/// # Example
/// ```
/// use calcexpr::errors::ValidationError;
/// use calcexpr::validate::validate_input;
///
/// assert!(validate_input("sin(30)").is_ok());
/// assert_eq!(validate_input("(1"), Err(ValidationError::UnbalancedParentheses));
/// ```
pub fn validate_input(input: &str) -> Result<(), ValidationError> {
    RULES.iter().try_for_each(|rule| rule(input))
}

fn not_empty(input: &str) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    Ok(())
}

fn within_length(input: &str) -> Result<(), ValidationError> {
    if input.chars().count() > MAX_LENGTH {
        return Err(ValidationError::InputTooLong);
    }
    Ok(())
}

fn allowed_alphabet(input: &str) -> Result<(), ValidationError> {
    if !input.chars().all(is_allowed) {
        return Err(ValidationError::InvalidCharacter);
    }
    Ok(())
}

fn balanced_parentheses(input: &str) -> Result<(), ValidationError> {
    let mut depth: usize = 0;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ValidationError::UnbalancedParentheses)?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ValidationError::UnbalancedParentheses);
    }
    Ok(())
}
