//! Character classes of the calculator alphabet.
//!
//! These predicates are shared by the validator (which restricts the alphabet) and
//! the lexer (which splits validated input into runs). Letters are ASCII only, so
//! the constant symbol `π` never counts as a letter.

/// Punctuation accepted by the validator besides operators and whitespace.
const PUNCTUATION: [char; 4] = ['(', ')', '.', ','];

/// Returns true for the ASCII digits `0`-`9`.
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Returns true for ASCII letters.
pub fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Returns true for the binary operator symbols `+ - * / ^`.
pub fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '^')
}

pub fn is_parenthesis(c: char) -> bool {
    matches!(c, '(' | ')')
}

/// Returns true for the constant symbols `π` and `e`.
pub fn is_constant(c: char) -> bool {
    matches!(c, 'π' | 'e')
}

pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

pub fn is_decimal_point(c: char) -> bool {
    c == '.'
}

/// Returns true if the validator accepts `c` anywhere in an expression.
pub fn is_allowed(c: char) -> bool {
    is_digit(c)
        || is_letter(c)
        || is_operator(c)
        || PUNCTUATION.contains(&c)
        || is_whitespace(c)
        || is_constant(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_are_ascii_only() {
        assert!(is_letter('x'));
        assert!(is_letter('Q'));
        assert!(!is_letter('π'));
        assert!(!is_letter('é'));
    }

    #[test]
    fn test_constants() {
        assert!(is_constant('π'));
        assert!(is_constant('e'));
        assert!(!is_constant('E'));
    }

    #[test]
    fn test_allowed_alphabet() {
        for c in "0123456789abcXYZ+-*/^().,π \t".chars() {
            assert!(is_allowed(c), "{c:?} should be allowed");
        }
        for c in "!=%&$#@;:[]{}<>".chars() {
            assert!(!is_allowed(c), "{c:?} should be rejected");
        }
    }
}
