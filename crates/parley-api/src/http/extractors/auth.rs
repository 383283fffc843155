//! Request authentication.
//!
//! Admin endpoints use API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and compared against the `api_keys` table.
//! The inbound webhook instead checks the chat gateway's shared token.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::http::error::AppError;
use crate::state::AppState;

/// Prefix of generated API keys.
pub const API_KEY_PREFIX: &str = "parley_";

/// Proof that the request carried a known API key. Holds the key's row id.
pub struct Authenticated(pub String);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(&parts.headers)?;

        let Some(key_id) = find_api_key(state, &hash_api_key(&api_key)).await? else {
            return Err(AppError::Unauthorized(format!("Invalid API key. {KEY_HINT}")));
        };

        if let Err(e) = touch_api_key(state, &key_id).await {
            tracing::debug!(key_id = %key_id, error = %e, "could not record API key use");
        }
        Ok(Authenticated(key_id))
    }
}

const KEY_HINT: &str =
    "Provide a key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.";

async fn find_api_key(state: &AppState, key_hash: &str) -> Result<Option<String>, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM api_keys WHERE key_hash = ?")
        .bind(key_hash)
        .fetch_optional(&state.db_pool.reader)
        .await
        .map_err(|e| AppError::Internal(format!("API key lookup failed: {e}")))?;
    Ok(row.map(|(id,)| id))
}

async fn touch_api_key(state: &AppState, key_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(key_id)
        .execute(&state.db_pool.writer)
        .await?;
    Ok(())
}

/// Read the API key from `Authorization: Bearer` or, failing that, `X-API-Key`.
fn extract_api_key(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(bearer) = header_text(headers, "authorization")?.and_then(|v| v.strip_prefix("Bearer ")) {
        return Ok(bearer.trim().to_string());
    }
    if let Some(key) = header_text(headers, "x-api-key")? {
        return Ok(key.trim().to_string());
    }

    Err(AppError::Unauthorized(format!("Missing API key. {KEY_HINT}")))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| AppError::Unauthorized(format!("Invalid {name} header encoding")))
        })
        .transpose()
}

/// Check the `X-Gateway-Token` header. No configured token accepts every request.
pub fn verify_gateway_token(headers: &HeaderMap, expected: Option<&SecretString>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = headers
        .get("x-gateway-token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Gateway-Token header".to_string()))?;

    if hash_api_key(provided) == hash_api_key(expected.expose_secret()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid gateway token".to_string()))
    }
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Generate a fresh plaintext API key.
fn generate_api_key() -> String {
    use aes_gcm::aead::{OsRng, rand_core::RngCore};
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    format!(
        "{API_KEY_PREFIX}{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}

/// Make sure an API key exists, creating one on first start.
///
/// Returns the plaintext key when one was created, `None` otherwise. Only
/// the hash is stored, so a lost key has to be replaced by deleting the row.
pub async fn ensure_api_key(state: &AppState) -> anyhow::Result<Option<String>> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM api_keys")
        .fetch_one(&state.db_pool.reader)
        .await?;
    if count > 0 {
        return Ok(None);
    }

    let plaintext_key = generate_api_key();
    sqlx::query("INSERT INTO api_keys (id, key_hash, name, created_at) VALUES (?, ?, 'default', ?)")
        .bind(uuid::Uuid::now_v7().to_string())
        .bind(hash_api_key(&plaintext_key))
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&state.db_pool.writer)
        .await?;

    tracing::info!("generated default API key");
    Ok(Some(plaintext_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hash_is_stable_hex() {
        let hash = hash_api_key("parley_abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key("parley_abc"));
        assert_ne!(hash, hash_api_key("parley_abd"));
    }

    #[test]
    fn generated_keys_are_prefixed_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with(API_KEY_PREFIX));
        assert_eq!(a.len(), API_KEY_PREFIX.len() + 64);
        assert_ne!(a, b);
    }

    #[test]
    fn api_key_from_either_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer  k1 "));
        assert_eq!(extract_api_key(&headers).unwrap(), "k1");

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("k2"));
        assert_eq!(extract_api_key(&headers).unwrap(), "k2");

        assert!(matches!(
            extract_api_key(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn gateway_token_check() {
        let expected = SecretString::from("gw-secret");
        let mut headers = HeaderMap::new();

        assert!(verify_gateway_token(&headers, None).is_ok());
        assert!(verify_gateway_token(&headers, Some(&expected)).is_err());

        headers.insert("x-gateway-token", HeaderValue::from_static("wrong"));
        assert!(verify_gateway_token(&headers, Some(&expected)).is_err());

        headers.insert("x-gateway-token", HeaderValue::from_static("gw-secret"));
        assert!(verify_gateway_token(&headers, Some(&expected)).is_ok());
    }

    #[tokio::test]
    async fn first_start_creates_a_single_usable_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf()).await.unwrap();

        let key = ensure_api_key(&state).await.unwrap().expect("key on first start");
        assert!(key.starts_with(API_KEY_PREFIX));
        assert!(ensure_api_key(&state).await.unwrap().is_none());

        let key_id = find_api_key(&state, &hash_api_key(&key)).await.unwrap();
        assert!(key_id.is_some());
        assert!(find_api_key(&state, &hash_api_key("parley_wrong")).await.unwrap().is_none());

        touch_api_key(&state, key_id.as_deref().unwrap()).await.unwrap();
        let (last_used,): (Option<String>,) =
            sqlx::query_as("SELECT last_used_at FROM api_keys")
                .fetch_one(&state.db_pool.reader)
                .await
                .unwrap();
        assert!(last_used.is_some());

        state.db_pool.close().await;
    }
}
