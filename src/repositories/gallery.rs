use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{
    error::{AppError, Result},
    models::gallery::Gallery,
};

/// Persistence for galleries.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    /// Finds a gallery by id.
    ///
    /// # Arguments
    ///
    /// * `id` - The gallery's id.
    ///
    /// # Returns
    ///
    /// A `Result` containing the gallery, or `None` if no row matches.
    async fn by_id(&self, id: i64) -> Result<Option<Gallery>>;

    /// Lists the galleries owned by a user, oldest first.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owner's id.
    ///
    /// # Returns
    ///
    /// A `Result` containing the galleries, possibly empty.
    async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>>;

    /// Inserts a gallery.
    ///
    /// # Arguments
    ///
    /// * `gallery` - The gallery to insert. Its `id` is ignored.
    ///
    /// # Returns
    ///
    /// A `Result` containing the gallery with its assigned id.
    async fn create(&self, gallery: Gallery) -> Result<Gallery>;

    /// Renames a gallery. The owner never changes.
    ///
    /// # Arguments
    ///
    /// * `gallery` - The gallery to write.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored gallery, or `NotFound` if no row has
    /// that id.
    async fn update(&self, gallery: Gallery) -> Result<Gallery>;

    /// Deletes a gallery.
    ///
    /// # Arguments
    ///
    /// * `id` - The gallery's id.
    ///
    /// # Returns
    ///
    /// An empty `Result`, or `NotFound` if no row has that id.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// `GalleryStore` backed by the PostgreSQL `galleries` table.
#[derive(Clone)]
pub struct PgGalleryStore {
    pool: Pool,
}

impl PgGalleryStore {
    /// Creates a new `PgGalleryStore`.
    ///
    /// # Arguments
    ///
    /// * `pool` - The database connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GalleryStore for PgGalleryStore {
    async fn by_id(&self, id: i64) -> Result<Option<Gallery>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT * FROM galleries WHERE id = $1", &[&id])
            .await?;
        row.map(|r| Gallery::from_row(&r)).transpose()
    }

    async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT *
                FROM galleries
                WHERE user_id = $1
                ORDER BY id ASC
                "#,
                &[&user_id],
            )
            .await?;
        rows.iter().map(Gallery::from_row).collect()
    }

    async fn create(&self, gallery: Gallery) -> Result<Gallery> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO galleries (user_id, title)
                VALUES ($1, $2)
                RETURNING *
                "#,
                &[&gallery.user_id, &gallery.title],
            )
            .await?;
        Gallery::from_row(&row)
    }

    async fn update(&self, gallery: Gallery) -> Result<Gallery> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE galleries
                SET title = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING *
                "#,
                &[&gallery.title, &gallery.id],
            )
            .await?
            .ok_or(AppError::NotFound)?;
        Gallery::from_row(&row)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM galleries WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
