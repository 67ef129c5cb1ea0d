//! Opaque refresh token value generation

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Generator for unguessable refresh token values
#[derive(Debug, Clone)]
pub struct RefreshTokenGenerator {
    /// Number of random bytes per token
    token_bytes: usize,
}

impl Default for RefreshTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshTokenGenerator {
    pub fn new() -> Self {
        Self { token_bytes: 32 }
    }

    /// Set the number of random bytes
    pub fn with_token_bytes(mut self, bytes: usize) -> Self {
        self.token_bytes = bytes;
        self
    }

    /// Generate a new URL-safe token value
    pub fn generate(&self) -> String {
        let mut random_bytes = vec![0u8; self.token_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        URL_SAFE_NO_PAD.encode(&random_bytes)
    }
}
