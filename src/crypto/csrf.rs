use base64::{Engine as _, engine::general_purpose};
use subtle::ConstantTimeEq;

use crate::crypto::keyed_hash::TokenHasher;
use crate::crypto::token;
use crate::error::{AppError, Result};

/// The size of the per-browser CSRF seed in bytes.
const CSRF_SEED_SIZE: usize = 32;

/// Issues and checks CSRF tokens.
///
/// Each browser holds a random seed in a cookie. The token embedded in forms
/// is the HMAC of that seed under the server's CSRF key, so a forged form
/// cannot carry a valid token without reading the victim's cookie.
#[derive(Clone)]
pub struct CsrfGuard {
    signer: TokenHasher,
}

impl CsrfGuard {
    pub fn new(key: &[u8]) -> Self {
        Self {
            signer: TokenHasher::new(key),
        }
    }

    /// Generates a new random seed.
    pub fn generate_seed(&self) -> Result<String> {
        token::random_string(CSRF_SEED_SIZE)
    }

    /// The form token for a seed.
    pub fn token_for(&self, seed: &str) -> CsrfToken {
        let signature = self.signer.digest(seed.as_bytes());
        CsrfToken(general_purpose::URL_SAFE_NO_PAD.encode(signature))
    }
}

/// The CSRF token expected on every form submitted by the current request's
/// browser.
#[derive(Clone, Debug)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks a submitted token in constant time.
    pub fn verify(&self, submitted: &str) -> Result<()> {
        if self.0.as_bytes().ct_eq(submitted.as_bytes()).into() {
            Ok(())
        } else {
            tracing::warn!("❌ CSRF: submitted token does not match");
            Err(AppError::CsrfMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_for_same_seed_verifies() {
        let guard = CsrfGuard::new(b"csrf-key");
        let seed = guard.generate_seed().unwrap();
        let token = guard.token_for(&seed);
        assert!(token.verify(guard.token_for(&seed).as_str()).is_ok());
    }

    #[test]
    fn token_for_other_seed_is_rejected() {
        let guard = CsrfGuard::new(b"csrf-key");
        let token = guard.token_for("seed-a");
        assert!(matches!(
            token.verify(guard.token_for("seed-b").as_str()),
            Err(AppError::CsrfMismatch)
        ));
        assert!(token.verify("").is_err());
    }

    #[test]
    fn token_depends_on_key() {
        let a = CsrfGuard::new(b"key-a").token_for("seed");
        let b = CsrfGuard::new(b"key-b").token_for("seed");
        assert!(a.verify(b.as_str()).is_err());
    }
}
