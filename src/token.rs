//! Random identifier generation with bounded collision retry
//!
//! Tokens are random UUIDs, so collisions with existing data are negligibly
//! likely but not impossible. Callers that need a verified-unused token run
//! the bounded search in [`unique_token`], which probes a caller-supplied
//! in-use check and gives up after [`MAX_TOKEN_ATTEMPTS`] collisions rather
//! than accepting a duplicate.

use crate::{Error, Result};
use uuid::Uuid;

/// Attempt limit for the uniqueness search
pub const MAX_TOKEN_ATTEMPTS: usize = 4;

/// Generate a fresh random token
///
/// Uniqueness against stored data is the caller's responsibility.
pub fn new_token() -> String {
    Uuid::new_v4().to_string()
}

/// Generate tokens until `in_use` reports one free, up to [`MAX_TOKEN_ATTEMPTS`]
///
/// Each collision is logged and retried with a new candidate. Probe errors
/// abort the search immediately.
pub fn unique_token<F>(mut in_use: F) -> Result<String>
where
    F: FnMut(&str) -> Result<bool>,
{
    for attempt in 1..=MAX_TOKEN_ATTEMPTS {
        let candidate = new_token();
        if !in_use(&candidate)? {
            return Ok(candidate);
        }
        tracing::warn!(attempt, candidate = %candidate, "token already in use, retrying");
    }
    Err(Error::ExhaustedRetries(MAX_TOKEN_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_distinct() {
        assert_ne!(new_token(), new_token());
    }

    #[test]
    fn test_unique_token_first_try() {
        let mut probes = 0;
        let token = unique_token(|_| {
            probes += 1;
            Ok(false)
        })
        .unwrap();
        assert_eq!(probes, 1);
        assert!(!token.is_empty());
    }

    #[test]
    fn test_unique_token_retries_then_succeeds() {
        // Three collisions, then a free candidate on the final attempt
        let mut probes = 0;
        let token = unique_token(|_| {
            probes += 1;
            Ok(probes <= 3)
        })
        .unwrap();
        assert_eq!(probes, 4);
        assert!(!token.is_empty());
    }

    #[test]
    fn test_unique_token_exhausts() {
        let mut probes = 0;
        let result = unique_token(|_| {
            probes += 1;
            Ok(true)
        });
        assert_eq!(probes, MAX_TOKEN_ATTEMPTS);
        assert!(matches!(result, Err(Error::ExhaustedRetries(4))));
    }

    #[test]
    fn test_unique_token_propagates_probe_error() {
        let result = unique_token(|_| Err(Error::Storage("backend unreachable".into())));
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
