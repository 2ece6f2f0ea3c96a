use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts, StoreError};
use crate::domain::user::User;

const COLUMNS: &str = "id, username, password, first_name, last_name, created_at, updated_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO user (id, username, password, first_name, last_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.username,
            user.password_hash,
            user.first_name,
            user.last_name,
            format_ts(&user.created_at),
            format_ts(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> Result<User, StoreError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM user WHERE id = ?1"),
            [id],
            RawUser::from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", id))?;
    raw.try_into()
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM user WHERE username = ?1"),
        [username],
        RawUser::from_row,
    )
    .optional()?
    .map(User::try_from)
    .transpose()
}

pub fn count_users(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?)
}

struct RawUser {
    id: String,
    username: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl TryFrom<RawUser> for User {
    type Error = StoreError;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: raw.id,
            username: raw.username,
            password_hash: raw.password,
            first_name: raw.first_name,
            last_name: raw.last_name,
            created_at: parse_ts(&raw.created_at)?,
            updated_at: parse_ts(&raw.updated_at)?,
        })
    }
}
