//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

/// Name of the persisted session entry.
pub const TOKEN_ENTRY: &str = "accessToken";

/// Name of the persisted cookie jar entry.
pub const COOKIE_ENTRY: &str = "cookies";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Base URL of the gallery REST API (default: http://localhost:8080).
    pub api_url: Url,

    /// Login entry point used for the forced-logout redirect (default: /login).
    pub login_path: String,

    /// Directory holding client-local persistent state
    /// (default: <config dir>/photo-gallery).
    pub state_dir: PathBuf,
}

impl GalleryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("GALLERY_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let api_url = Url::parse(&api_url).context("GALLERY_API_URL must be a valid URL")?;

        let login_path = env::var("GALLERY_LOGIN_PATH").unwrap_or_else(|_| "/login".to_string());

        let state_dir = match env::var("GALLERY_STATE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()
                .map(|d| d.join("photo-gallery"))
                .context("no config directory available; set GALLERY_STATE_DIR")?,
        };

        Ok(Self::new(api_url, login_path, state_dir))
    }

    /// Build a configuration from explicit values.
    pub fn new(api_url: Url, login_path: impl Into<String>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_url,
            login_path: login_path.into(),
            state_dir: state_dir.into(),
        }
    }

    /// Path of the persisted session token.
    pub fn token_path(&self) -> PathBuf {
        self.state_dir.join(TOKEN_ENTRY)
    }

    /// Path of the persisted cookie jar.
    pub fn cookie_path(&self) -> PathBuf {
        self.state_dir.join(COOKIE_ENTRY)
    }
}
