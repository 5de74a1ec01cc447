use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// Persistence for user records.
///
/// Lookups return `Ok(None)` when no row matches; every other failure is an
/// error. Implementations store exactly what they are given: normalization
/// and hashing happen before a record reaches the store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by id.
    ///
    /// # Arguments
    ///
    /// * `id` - The user's id.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user, or `None` if no row matches.
    async fn by_id(&self, id: i64) -> Result<Option<User>>;

    /// Finds a user by an already normalized email address.
    ///
    /// # Arguments
    ///
    /// * `email` - The trimmed, lowercased address.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user, or `None` if no row matches.
    async fn by_email(&self, email: &str) -> Result<Option<User>>;

    /// Finds a user by the keyed hash of their remember token.
    ///
    /// # Arguments
    ///
    /// * `remember_hash` - The hash produced by `TokenHasher::hash`.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user, or `None` if no row matches.
    async fn by_remember_hash(&self, remember_hash: &str) -> Result<Option<User>>;

    /// Inserts a user.
    ///
    /// # Arguments
    ///
    /// * `user` - The user to insert. Its `id` is ignored.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user with its assigned id, or `EmailTaken`
    /// if the address is already in use.
    async fn create(&self, user: User) -> Result<User>;

    /// Overwrites the stored user with the same id.
    ///
    /// # Arguments
    ///
    /// * `user` - The user to write.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored user, or `NotFound` if no row has
    /// that id.
    async fn update(&self, user: User) -> Result<User>;

    /// Deletes a user and, through the foreign key, their galleries.
    ///
    /// # Arguments
    ///
    /// * `id` - The user's id.
    ///
    /// # Returns
    ///
    /// An empty `Result`, or `NotFound` if no row has that id.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// `UserStore` backed by the PostgreSQL `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    /// Creates a new `PgUserStore`.
    ///
    /// # Arguments
    ///
    /// * `pool` - The database connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, sql: &str, param: &(dyn tokio_postgres::types::ToSql + Sync)) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client.query_opt(sql, &[param]).await?;
        row.map(|r| User::from_row(&r)).transpose()
    }
}

/// A unique violation on `users.email` means the address was taken between
/// the availability check and the write.
fn map_write_error(e: tokio_postgres::Error) -> AppError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let on_email = e
            .as_db_error()
            .and_then(|db| db.constraint())
            .is_some_and(|c| c.contains("email"));
        if on_email {
            return AppError::EmailTaken;
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn by_id(&self, id: i64) -> Result<Option<User>> {
        self.find_one("SELECT * FROM users WHERE id = $1", &id).await
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("SELECT * FROM users WHERE email = $1", &email).await
    }

    async fn by_remember_hash(&self, remember_hash: &str) -> Result<Option<User>> {
        self.find_one("SELECT * FROM users WHERE remember_hash = $1", &remember_hash)
            .await
    }

    async fn create(&self, user: User) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (name, email, password_hash, remember_hash)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
                &[&user.name, &user.email, &user.password_hash, &user.remember_hash],
            )
            .await
            .map_err(map_write_error)?;
        let created = User::from_row(&row)?;
        tracing::info!("✅ User created with ID: {}", created.id);
        Ok(created)
    }

    async fn update(&self, user: User) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE users
                SET
                    name = $1,
                    email = $2,
                    password_hash = $3,
                    remember_hash = $4,
                    updated_at = NOW()
                WHERE id = $5
                RETURNING *
                "#,
                &[
                    &user.name,
                    &user.email,
                    &user.password_hash,
                    &user.remember_hash,
                    &user.id,
                ],
            )
            .await
            .map_err(map_write_error)?
            .ok_or(AppError::NotFound)?;
        User::from_row(&row)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("🗑️ User deleted: {}", id);
        Ok(())
    }
}
