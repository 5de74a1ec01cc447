use std::sync::Arc;

use crate::{
    error::{AppError, Result},
    models::{gallery::Gallery, user::User},
    repositories::gallery::GalleryStore,
};

fn validate(gallery: &Gallery) -> Result<()> {
    if gallery.user_id <= 0 {
        return Err(AppError::RequiredUserId);
    }
    if gallery.title.trim().is_empty() {
        return Err(AppError::RequiredTitle);
    }
    Ok(())
}

/// Gallery operations with validation and ownership checks applied.
#[derive(Clone)]
pub struct GalleryService {
    store: Arc<dyn GalleryStore>,
}

impl GalleryService {
    /// Creates a new `GalleryService`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where galleries are persisted.
    pub fn new(store: Arc<dyn GalleryStore>) -> Self {
        Self { store }
    }

    /// Finds a gallery by id, with no ownership check.
    pub async fn by_id(&self, id: i64) -> Result<Gallery> {
        self.store.by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Fetches a gallery and checks that `user` owns it.
    ///
    /// # Arguments
    ///
    /// * `id` - The gallery's id.
    /// * `user` - The signed-in user.
    ///
    /// # Returns
    ///
    /// A `Result` containing the gallery, `NotFound` if it does not exist or
    /// `Forbidden` if someone else owns it.
    pub async fn owned_by(&self, id: i64, user: &User) -> Result<Gallery> {
        let gallery = self.by_id(id).await?;
        if !gallery.is_owned_by(user.id) {
            tracing::warn!(
                "❌ User {} attempted to modify gallery {} owned by {}",
                user.id,
                gallery.id,
                gallery.user_id
            );
            return Err(AppError::Forbidden);
        }
        Ok(gallery)
    }

    pub async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>> {
        self.store.by_user_id(user_id).await
    }

    /// Trims the title, validates and persists a new gallery.
    ///
    /// # Arguments
    ///
    /// * `gallery` - The gallery, with its owner set.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored gallery, `RequiredTitle` or
    /// `RequiredUserId`.
    pub async fn create(&self, mut gallery: Gallery) -> Result<Gallery> {
        gallery.title = gallery.title.trim().to_string();
        validate(&gallery)?;
        let gallery = self.store.create(gallery).await?;
        tracing::info!("✅ Gallery created with ID: {}", gallery.id);
        Ok(gallery)
    }

    pub async fn update(&self, mut gallery: Gallery) -> Result<Gallery> {
        gallery.title = gallery.title.trim().to_string();
        validate(&gallery)?;
        self.store.update(gallery).await
    }

    /// Deletes a gallery row. Its image files are the caller's concern.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if id <= 0 {
            return Err(AppError::InvalidId);
        }
        self.store.delete(id).await?;
        tracing::info!("🗑️ Gallery deleted: {}", id);
        Ok(())
    }
}
