use crate::error::{AppError, Result};
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;

/// The number of random bytes in a remember token.
pub const REMEMBER_TOKEN_BYTES: usize = 32;

/// Generates `n` cryptographically random bytes.
pub fn random_bytes(n: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(format!("Failed to generate random bytes: {}", e)))?;
    Ok(bytes)
}

/// Generates `n_bytes` random bytes and returns them URL-safe base64 encoded.
pub fn random_string(n_bytes: usize) -> Result<String> {
    Ok(general_purpose::URL_SAFE.encode(random_bytes(n_bytes)?))
}

/// Generates a new remember token.
pub fn remember_token() -> Result<String> {
    random_string(REMEMBER_TOKEN_BYTES)
}

/// Returns the number of bytes encoded in a URL-safe base64 string.
pub fn decoded_len(token: &str) -> Result<usize> {
    general_purpose::URL_SAFE
        .decode(token)
        .map(|bytes| bytes.len())
        .map_err(|_| AppError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_tokens_carry_32_bytes() {
        let token = remember_token().unwrap();
        assert_eq!(decoded_len(&token).unwrap(), REMEMBER_TOKEN_BYTES);
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(remember_token().unwrap(), remember_token().unwrap());
    }

    #[test]
    fn decoded_len_rejects_garbage() {
        assert!(matches!(decoded_len("not base64!"), Err(AppError::MalformedToken)));
        assert_eq!(decoded_len(&random_string(8).unwrap()).unwrap(), 8);
    }
}
