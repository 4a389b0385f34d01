use std::{path::PathBuf, sync::Arc, time::Duration};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fs::config_dir;

pub type Cfg = Arc<RwLock<CoreConfig>>;

/// Settings read from `config.toml` in the XDG config directory. Missing
/// file or missing keys fall back to defaults, so a fresh machine works
/// without any setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Seconds between watcher polls of the stored collection.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Overrides the XDG state directory as the storage location.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default)]
    pub admin: AdminCredentials,
}

/// The static credential pair gating admin mutations. A plain comparison,
/// nothing more; anyone with the library in hand can mutate data anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl CoreConfig {
    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    pub fn load() -> Self {
        match std::fs::read_to_string(Self::config_path()) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                warn!(%err, "config file is unreadable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[cfg(test)]
    pub(crate) fn mock() -> Self {
        Self::default()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            storage_dir: None,
            admin: AdminCredentials::default(),
        }
    }
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();

        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password, "admin123");
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: CoreConfig = toml::from_str("poll_interval_secs = 5").unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.admin.username, "admin");
        assert!(config.storage_dir.is_none());
    }
}
