use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Minimum length of the signing keys when running in production.
const MIN_SECRET_LEN: usize = 32;

/// PostgreSQL connection parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    /// One of `disable`, `prefer` or `require`.
    pub ssl_mode: String,
    pub time_zone: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "password".to_string(),
            db_name: "shutterbox".to_string(),
            ssl_mode: "disable".to_string(),
            time_zone: "UTC".to_string(),
        }
    }
}

/// The on-disk shape of `config.json`.
#[derive(Deserialize)]
#[serde(default)]
struct ConfigFile {
    port: u16,
    env: String,
    hmac_key: String,
    csrf_key: String,
    brand_name: String,
    images_dir: PathBuf,
    assets_dir: PathBuf,
    max_upload_bytes: usize,
    database: DatabaseConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            port: 3000,
            env: "dev".to_string(),
            hmac_key: "dev-only-remember-token-hmac-key".to_string(),
            csrf_key: "dev-only-csrf-token-signing-key!".to_string(),
            brand_name: "Shutterbox".to_string(),
            images_dir: PathBuf::from("images"),
            assets_dir: PathBuf::from("assets"),
            max_upload_bytes: 32 * 1024 * 1024,
            database: DatabaseConfig::default(),
        }
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The port the HTTP server binds to.
    pub port: u16,
    /// `dev` or `prod`.
    pub env: String,
    /// The key used to hash remember tokens before they are stored.
    pub hmac_key: Zeroizing<String>,
    /// The key used to sign CSRF tokens.
    pub csrf_key: Zeroizing<String>,
    /// The name shown in the navigation bar.
    pub brand_name: String,
    /// The root directory uploaded images are written under.
    pub images_dir: PathBuf,
    /// The directory served under `/assets/`.
    pub assets_dir: PathBuf,
    /// The maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// The database connection parameters.
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            port: file.port,
            env: file.env,
            hmac_key: Zeroizing::new(file.hmac_key),
            csrf_key: Zeroizing::new(file.csrf_key),
            brand_name: file.brand_name,
            images_dir: file.images_dir,
            assets_dir: file.assets_dir,
            max_upload_bytes: file.max_upload_bytes,
            database: file.database,
        }
    }
}

impl Config {
    /// Whether the application runs in production.
    pub fn is_prod(&self) -> bool {
        self.env == "prod"
    }

    /// Loads the configuration.
    ///
    /// Reads the JSON file named by `CONFIG_PATH` (default `config.json`).
    /// When `require_file` is false and the file does not exist the defaults
    /// are used instead.
    pub fn load(require_file: bool) -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
        let path = Path::new(&path);

        if !path.exists() {
            if require_file {
                anyhow::bail!("{} is required in production", path.display());
            }
            tracing::warn!("⚠️ {} not found, using the default config", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_json(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if require_file && !config.is_prod() {
            anyhow::bail!("env must be \"prod\" when running with --prod");
        }
        config.validate()?;

        tracing::info!("✅ Loaded {}", path.display());
        Ok(config)
    }

    /// Parses a JSON document; missing fields take their default value.
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ConfigFile = sonic_rs::from_str(contents)?;
        Ok(file.into())
    }

    fn validate(&self) -> Result<()> {
        if self.env != "dev" && self.env != "prod" {
            anyhow::bail!("env must be \"dev\" or \"prod\", got {:?}", self.env);
        }
        if self.is_prod() {
            if self.hmac_key.len() < MIN_SECRET_LEN {
                anyhow::bail!("hmac_key must be at least {MIN_SECRET_LEN} bytes in production");
            }
            if self.csrf_key.len() < MIN_SECRET_LEN {
                anyhow::bail!("csrf_key must be at least {MIN_SECRET_LEN} bytes in production");
            }
        }
        Ok(())
    }
}
