//! Public access tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

/// Random bytes per token (128 bits).
pub const TOKEN_BYTES: usize = 16;

#[derive(Debug, Error)]
#[error("Secure random source unavailable")]
pub struct TokenError;

/// Source of unguessable, URL-safe public tokens.
pub trait TokenSource: Send + Sync {
    fn mint(&self) -> Result<String, TokenError>;
}

/// Tokens drawn from the operating system's CSPRNG.
pub struct RandomTokens {
    rng: SystemRandom,
}

impl RandomTokens {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for RandomTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for RandomTokens {
    fn mint(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| TokenError)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_url_safe() {
        let token = RandomTokens::new().mint().unwrap();
        assert_eq!(token.len(), 22);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let tokens = RandomTokens::new();
        let minted: HashSet<String> = (0..1000).map(|_| tokens.mint().unwrap()).collect();
        assert_eq!(minted.len(), 1000);
    }
}
