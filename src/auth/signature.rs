//! Request signatures.
//!
//! Every request made with a session carries the session token and a
//! signature proving possession of the API secret:
//!
//! ```text
//! X-Token:     <token>
//! X-Signature: hex(sha256(api_secret ++ token))
//! ```

use sha2::{Digest, Sha256};

use super::ApiSecret;

/// Computes the signature for a session token.
pub(crate) fn sign(secret: &ApiSecret, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.expose().as_bytes());
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
