//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GO_MARKETPLACE_STORAGE_DIR` - Directory holding the cart file
//!   (default: `<platform data dir>/go-marketplace`, or `./.go-marketplace`)
//! - `GO_MARKETPLACE_STORAGE_KEY` - Storage slot name (default: `@GoMarketplace:products`)

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::context::CartHandle;
use crate::storage::{FileStorage, STORAGE_KEY};

const STORAGE_DIR_VAR: &str = "GO_MARKETPLACE_STORAGE_DIR";
const STORAGE_KEY_VAR: &str = "GO_MARKETPLACE_STORAGE_KEY";
const APP_DIR_NAME: &str = "go-marketplace";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Invalid option {0}: {1}")]
    InvalidOption(String, String),
}

/// Where and under which key the cart is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory for the file storage backend
    pub storage_dir: PathBuf,
    /// Key of the storage slot holding the cart
    pub storage_key: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_dir = match get(STORAGE_DIR_VAR) {
            Some(dir) => check_dir(PathBuf::from(dir))
                .map_err(|reason| ConfigError::InvalidEnvVar(STORAGE_DIR_VAR.to_string(), reason))?,
            None => default_storage_dir(),
        };

        let storage_key = match get(STORAGE_KEY_VAR) {
            Some(key) => check_key(key)
                .map_err(|reason| ConfigError::InvalidEnvVar(STORAGE_KEY_VAR.to_string(), reason))?,
            None => STORAGE_KEY.to_string(),
        };

        Ok(Self {
            storage_dir,
            storage_key,
        })
    }

    /// Apply command-line overrides, with the same checks as the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidOption` if an override is blank.
    pub fn with_overrides(
        mut self,
        storage_dir: Option<PathBuf>,
        storage_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = storage_dir {
            self.storage_dir = check_dir(dir)
                .map_err(|reason| ConfigError::InvalidOption("--storage-dir".to_string(), reason))?;
        }
        if let Some(key) = storage_key {
            self.storage_key = check_key(key)
                .map_err(|reason| ConfigError::InvalidOption("--key".to_string(), reason))?;
        }
        Ok(self)
    }

    /// The file storage backend for this configuration.
    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.storage_dir)
    }

    /// Open the configured cart, loading any stored snapshot.
    pub async fn open_cart(&self) -> CartHandle {
        CartHandle::open(Arc::new(self.storage()), self.storage_key.clone()).await
    }
}

fn check_dir(dir: PathBuf) -> Result<PathBuf, String> {
    if dir.as_os_str().to_string_lossy().trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(dir)
}

fn check_key(key: String) -> Result<String, String> {
    if key.is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(key)
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".go-marketplace"),
        |dir| dir.join(APP_DIR_NAME),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_vars(lookup(&[])).unwrap();
        assert_eq!(config.storage_key, STORAGE_KEY);
        assert!(config.storage_dir.ends_with(".go-marketplace") || config.storage_dir.ends_with(APP_DIR_NAME));
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::from_vars(lookup(&[
            (STORAGE_DIR_VAR, "/tmp/carts"),
            (STORAGE_KEY_VAR, "@Test:products"),
        ]))
        .unwrap();

        assert_eq!(config.storage_dir, PathBuf::from("/tmp/carts"));
        assert_eq!(config.storage_key, "@Test:products");
        assert_eq!(config.storage().dir(), PathBuf::from("/tmp/carts"));
    }

    #[test]
    fn test_rejects_empty_values() {
        assert!(matches!(
            CartConfig::from_vars(lookup(&[(STORAGE_KEY_VAR, "")])),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == STORAGE_KEY_VAR
        ));
        assert!(matches!(
            CartConfig::from_vars(lookup(&[(STORAGE_DIR_VAR, "  ")])),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == STORAGE_DIR_VAR
        ));
    }

    #[test]
    fn test_overrides_are_checked_like_env() {
        let base = CartConfig::from_vars(lookup(&[])).unwrap();

        assert!(matches!(
            base.clone().with_overrides(None, Some(String::new())),
            Err(ConfigError::InvalidOption(flag, _)) if flag == "--key"
        ));
        assert!(matches!(
            base.clone().with_overrides(Some(PathBuf::from(" ")), None),
            Err(ConfigError::InvalidOption(flag, _)) if flag == "--storage-dir"
        ));

        let config = base
            .clone()
            .with_overrides(Some(PathBuf::from("/tmp/carts")), Some("@Test:products".to_string()))
            .unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/carts"));
        assert_eq!(config.storage_key, "@Test:products");

        assert_eq!(base.clone().with_overrides(None, None).unwrap(), base);
    }

    #[tokio::test]
    async fn test_open_cart_uses_configured_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = CartConfig {
            storage_dir: tmp.path().to_path_buf(),
            storage_key: STORAGE_KEY.to_string(),
        };

        let cart = config.open_cart().await;
        cart.add_to_cart(go_marketplace_core::NewLineItem::new(
            go_marketplace_core::ProductId::parse("A").unwrap(),
            "Shirt",
            "u",
            go_marketplace_core::Price::from_cents(1000),
        ))
        .await
        .unwrap();

        assert!(config.storage().slot_path(STORAGE_KEY).exists());
    }
}
