//! Opaque bearer tokens.
//!
//! Tokens are 32 random bytes, hex encoded. Only their SHA-256 digest is
//! stored, so a leaked table cannot be replayed.
use crate::store::{PracticeStore, StoreResult};
use axum::http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const TOKEN_BYTES: usize = 32;

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim).filter(|token| !token.is_empty())
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a token for `user_id`, store its digest, and return the plain value.
pub async fn issue_token(store: &dyn PracticeStore, user_id: Uuid) -> StoreResult<String> {
    let token = generate_token();
    store.insert_api_token(&hash_token(&token), user_id).await?;
    Ok(token)
}
