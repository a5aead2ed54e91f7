use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

use dsv_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Settings for the datasets HTTP service.
///
/// Every field is optional in a config file; missing ones take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Prefix for every route except the root health check.
    pub api_prefix: String,
    pub service_name: String,
    /// Allowed CORS origins; `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
    pub store: StoreConfig,
    /// Free-form labels logged at startup.
    pub metadata: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            api_prefix: "/v1".into(),
            service_name: "datasets-service".into(),
            cors_origins: vec!["*".into()],
            max_upload_bytes: 64 * 1024 * 1024,
            store: StoreConfig::default(),
            metadata: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// The API prefix with one leading slash and no trailing slash.
    /// Empty when routes are mounted at the root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.api_prefix, "/v1");
        assert_eq!(c.service_name, "datasets-service");
        assert_eq!(c.cors_origins, vec!["*".to_string()]);
        assert!(c.metadata.is_empty());
        assert_eq!(c.store.root, PathBuf::from("/tmp/_datasets"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            service_name = "from-file"

            [store]
            root = "/srv/datasets"

            [metadata]
            owner = "datasets-team"
            "#,
        )
        .unwrap();

        assert_eq!(c.service_name, "from-file");
        assert_eq!(c.store.root, PathBuf::from("/srv/datasets"));
        assert!(!c.store.sync_writes);
        assert_eq!(c.metadata.get("owner").map(String::as_str), Some("datasets-team"));
        assert_eq!(c.api_prefix, "/v1");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:9000\"\n").unwrap();
        let c = ServerConfig::load(&path).unwrap();
        assert_eq!(c.bind_addr.port(), 9000);

        assert!(ServerConfig::load(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn prefix_normalization() {
        let mut c = ServerConfig::default();
        assert_eq!(c.normalized_prefix(), "/v1");
        c.api_prefix = "api/v2/".into();
        assert_eq!(c.normalized_prefix(), "/api/v2");
        c.api_prefix = "/".into();
        assert_eq!(c.normalized_prefix(), "");
    }
}
