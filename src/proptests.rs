//! Property-based tests for validation, lexing and caching.

use proptest::prelude::*;

use crate::chars::is_whitespace;
use crate::errors::ValidationError;
use crate::lexer::tokenize_str;
use crate::perf::lru::LruCache;
use crate::validate::validate_input;

// Strategy for parenthesis-free text drawn from the calculator alphabet
fn alphabet_text() -> impl Strategy<Value = String> {
    "[0-9a-zA-Z+*/^., π-]{1,40}"
}

// Strategy for arbitrary short text, including characters outside the alphabet
fn any_text() -> impl Strategy<Value = String> {
    "\\PC{0,40}"
}

proptest! {
    #[test]
    fn balanced_alphabet_text_is_valid(body in alphabet_text(), depth in 0usize..10) {
        let input = format!("{}{}{}", "(".repeat(depth), body, ")".repeat(depth));
        prop_assert_eq!(validate_input(&input), Ok(()));
    }

    #[test]
    fn unequal_parentheses_are_unbalanced(opens in 0usize..20, closes in 0usize..20) {
        prop_assume!(opens != closes);
        let input = format!("{}1{}", "(".repeat(opens), ")".repeat(closes));
        prop_assert_eq!(validate_input(&input), Err(ValidationError::UnbalancedParentheses));
    }

    #[test]
    fn foreign_character_is_rejected(body in alphabet_text(), bad in "[#$%&@!?;:~]") {
        let input = format!("{body}{bad}");
        prop_assert_eq!(validate_input(&input), Err(ValidationError::InvalidCharacter));
    }

    #[test]
    fn tokens_cover_every_non_whitespace_character(input in any_text()) {
        let tokens = tokenize_str(&input);
        let joined: String = tokens.iter().map(|t| t.value.as_str()).collect();
        let expected: String = input.chars().filter(|c| !is_whitespace(*c)).collect();
        prop_assert_eq!(joined, expected);

        for token in &tokens {
            prop_assert_eq!(&input[token.position..token.end()], token.value.as_str());
        }
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].end() <= pair[1].position);
        }
    }

    #[test]
    fn lru_never_exceeds_capacity(
        capacity in 1usize..8,
        keys in proptest::collection::vec(0u8..20, 1..100),
    ) {
        let mut cache = LruCache::new(capacity);
        for key in &keys {
            cache.set(key.to_string(), *key);
            prop_assert!(cache.size() <= capacity);
        }
        let last = keys[keys.len() - 1].to_string();
        prop_assert_eq!(cache.get(&last), keys.last());
        prop_assert_eq!(cache.keys()[0], last.as_str());
    }
}
