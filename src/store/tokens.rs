use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_ts, parse_ts, StoreError};

/// A persisted bearer credential, keyed by the SHA-256 of the token.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub user_id: String,
    pub kind: String,
    pub expires_at: DateTime<Utc>,
}

pub fn insert_token(
    conn: &Connection,
    token_hash: &[u8; 32],
    token: &StoredToken,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO auth_token (token_hash, user_id, kind, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            token_hash.as_slice(),
            token.user_id,
            token.kind,
            format_ts(&token.expires_at),
            format_ts(&Utc::now()),
        ],
    )?;
    Ok(())
}

pub fn find_token(
    conn: &Connection,
    token_hash: &[u8; 32],
) -> Result<Option<StoredToken>, StoreError> {
    let row = conn
        .query_row(
            "SELECT user_id, kind, expires_at FROM auth_token WHERE token_hash = ?1",
            [token_hash.as_slice()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;
    row.map(|(user_id, kind, expires_at)| {
        Ok(StoredToken {
            user_id,
            kind,
            expires_at: parse_ts(&expires_at)?,
        })
    })
    .transpose()
}

/// Drop tokens that expired before `now`; returns how many were removed.
pub fn purge_expired(conn: &Connection, now: &DateTime<Utc>) -> Result<usize, StoreError> {
    Ok(conn.execute(
        "DELETE FROM auth_token WHERE expires_at < ?1",
        [format_ts(now)],
    )?)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::store::test_support::store_with_user;

    #[test]
    fn tokens_are_found_by_hash_and_purged_after_expiry() {
        let (store, user) = store_with_user("pharmacist");
        let live = StoredToken {
            user_id: user.id.clone(),
            kind: "access".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        };
        let stale = StoredToken {
            expires_at: Utc::now() - Duration::minutes(5),
            ..live.clone()
        };
        store
            .write(|tx| {
                insert_token(tx, &[1; 32], &live)?;
                insert_token(tx, &[2; 32], &stale)
            })
            .unwrap();

        let found = store.read(|conn| find_token(conn, &[1; 32])).unwrap();
        assert_eq!(found.map(|t| t.kind), Some("access".to_string()));

        let purged = store.write(|tx| purge_expired(tx, &Utc::now())).unwrap();
        assert_eq!(purged, 1);
        assert!(store.read(|conn| find_token(conn, &[2; 32])).unwrap().is_none());
    }
}
