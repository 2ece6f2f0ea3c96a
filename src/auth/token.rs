//! Random bearer tokens persisted as SHA-256 digests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::AuthError;
use crate::store::tokens::{self, StoredToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Lifetimes applied when tokens are issued.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// URL-safe base64 over 32 random bytes.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn issue(
    conn: &Connection,
    user_id: &str,
    kind: TokenKind,
    expires_at: DateTime<Utc>,
) -> Result<String, AuthError> {
    let token = generate_token();
    tokens::insert_token(
        conn,
        &hash_token(&token),
        &StoredToken {
            user_id: user_id.to_string(),
            kind: kind.as_str().to_string(),
            expires_at,
        },
    )?;
    Ok(token)
}

pub fn issue_pair(
    conn: &Connection,
    user_id: &str,
    policy: &TokenPolicy,
) -> Result<TokenPair, AuthError> {
    let now = Utc::now();
    tokens::purge_expired(conn, &now)?;
    Ok(TokenPair {
        access_token: issue(conn, user_id, TokenKind::Access, now + policy.access_ttl)?,
        refresh_token: issue(conn, user_id, TokenKind::Refresh, now + policy.refresh_ttl)?,
        token_type: "bearer",
    })
}

/// Resolve a presented token to its user id.
pub fn authenticate(
    conn: &Connection,
    token: &str,
    kind: TokenKind,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let stored = tokens::find_token(conn, &hash_token(token))?.ok_or(AuthError::InvalidToken)?;
    if stored.kind != kind.as_str() {
        return Err(AuthError::InvalidToken);
    }
    if stored.expires_at <= now {
        return Err(AuthError::TokenExpired);
    }
    Ok(stored.user_id)
}

/// Trade a live refresh token for a new access token. The refresh token
/// stays valid until its own expiry.
pub fn refresh(
    conn: &Connection,
    refresh_token: &str,
    policy: &TokenPolicy,
) -> Result<TokenPair, AuthError> {
    let now = Utc::now();
    let user_id = authenticate(conn, refresh_token, TokenKind::Refresh, now)?;
    Ok(TokenPair {
        access_token: issue(conn, &user_id, TokenKind::Access, now + policy.access_ttl)?,
        refresh_token: refresh_token.to_string(),
        token_type: "bearer",
    })
}
