use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Computes keyed hashes of tokens so raw tokens never reach the database.
#[derive(Clone)]
pub struct TokenHasher {
    key: Arc<Zeroizing<Vec<u8>>>,
}

impl TokenHasher {
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: Arc::new(Zeroizing::new(key.to_vec())),
        }
    }

    /// HMAC-SHA256 of `input`, URL-safe base64 encoded.
    pub fn hash(&self, input: &str) -> String {
        general_purpose::URL_SAFE.encode(self.digest(input.as_bytes()))
    }

    /// Raw HMAC-SHA256 of `input`.
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length.
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any size"));
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}
