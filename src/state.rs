use std::sync::Arc;

use tower_cookies::cookie::time::Duration;

use crate::config::Config;
use crate::crypto::{csrf::CsrfGuard, keyed_hash::TokenHasher};
use crate::error::Result;
use crate::repositories::{
    gallery::{GalleryStore, PgGalleryStore},
    user::{PgUserStore, UserStore},
};
use crate::services::{galleries::GalleryService, images::ImageStore, users::UserService};
use crate::views::{ViewConfig, Views};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Users behind the validation chain.
    pub users: UserService,
    /// Galleries with ownership checks.
    pub galleries: GalleryService,
    /// Image files on disk.
    pub images: ImageStore,
    /// The view layer.
    pub views: Views,
    /// CSRF token issuing.
    pub csrf: CsrfGuard,
}

impl AppState {
    /// Connects to PostgreSQL, migrates the schema and wires the services.
    pub async fn new(config: Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database)?;
        crate::db::migrate(&pool).await?;
        tracing::info!("✅ PostgreSQL pool initialized");

        Ok(Self::with_stores(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgGalleryStore::new(pool)),
        ))
    }

    /// Wires the services over the given stores.
    pub fn with_stores(
        config: Config,
        user_store: Arc<dyn UserStore>,
        gallery_store: Arc<dyn GalleryStore>,
    ) -> Self {
        let hasher = TokenHasher::new(config.hmac_key.as_bytes());
        let csrf = CsrfGuard::new(config.csrf_key.as_bytes());
        let images = ImageStore::new(config.images_dir.clone());
        let views = Views::new(ViewConfig {
            brand_name: config.brand_name.clone(),
            secure_cookies: config.is_prod(),
            alert_ttl: Duration::minutes(5),
        });

        AppState {
            users: UserService::new(user_store, hasher),
            galleries: GalleryService::new(gallery_store),
            images,
            views,
            csrf,
            config: Arc::new(config),
        }
    }
}
