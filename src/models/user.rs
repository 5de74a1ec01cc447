use chrono::{DateTime, Utc};
use std::fmt;
use tokio_postgres::Row;

use crate::error::Result;

/// Represents a user in the system.
///
/// `password` and `remember` hold plaintext values only while a record moves
/// through the validation chain; they are never persisted.
#[derive(Clone, Default)]
pub struct User {
    /// The unique identifier for the user. Zero until persisted.
    pub id: i64,
    /// The user's display name.
    pub name: String,
    /// The user's normalized email address.
    pub email: String,
    /// Plaintext password, cleared once hashed.
    pub password: Option<String>,
    /// The Argon2 hash of the user's password.
    pub password_hash: String,
    /// Plaintext remember token, cleared once hashed.
    pub remember: Option<String>,
    /// The keyed hash of the user's remember token.
    pub remember_hash: String,
    /// The timestamp when the user was created.
    pub created_at: Option<DateTime<Utc>>,
    /// The timestamp when the user was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// A new, unsaved user from signup form input.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: None,
            password_hash: row.try_get("password_hash")?,
            remember: None,
            remember_hash: row.try_get("remember_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
