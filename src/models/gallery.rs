use chrono::{DateTime, Utc};
use tokio_postgres::Row;

use crate::error::Result;

/// Represents a gallery in the system.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    /// The unique identifier for the gallery. Zero until persisted.
    pub id: i64,
    /// The ID of the user who owns the gallery.
    pub user_id: i64,
    /// The title of the gallery.
    pub title: String,
    /// The timestamp when the gallery was created.
    pub created_at: Option<DateTime<Utc>>,
    /// The timestamp when the gallery was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Gallery {
    pub fn new(user_id: i64, title: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Whether the given user owns this gallery.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
