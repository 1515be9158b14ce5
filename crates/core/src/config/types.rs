use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pager: PagerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// HS256 signing secret, required for the jwt method.
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    Jwt,
}

/// Counter store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    /// Database file, required when backend = "sqlite".
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Memory
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// Paging (SMS) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PagerConfig {
    #[serde(default = "default_pager_backend")]
    pub backend: PagerBackend,
    /// Gateway endpoint, required when backend = "http".
    #[serde(default)]
    pub url: Option<String>,
    /// Sender address, required when backend = "http".
    #[serde(default)]
    pub from: Option<String>,
    /// Bearer token for the gateway.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_pager_timeout")]
    pub timeout_secs: u32,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            backend: default_pager_backend(),
            url: None,
            from: None,
            auth_token: None,
            timeout_secs: default_pager_timeout(),
        }
    }
}

fn default_pager_backend() -> PagerBackend {
    PagerBackend::None
}

fn default_pager_timeout() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PagerBackend {
    None,
    Http,
}

/// Queue engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Bound on a single queue operation in milliseconds (default: 5000)
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

fn default_op_timeout_ms() -> u64 {
    5000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub pager: SanitizedPagerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: AuthMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPagerConfig {
    pub backend: PagerBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method,
            },
            server: config.server.clone(),
            store: config.store.clone(),
            pager: SanitizedPagerConfig {
                backend: config.pager.backend,
                url: config.pager.url.clone(),
                from: config.pager.from.clone(),
                timeout_secs: config.pager.timeout_secs,
            },
            engine: config.engine.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 8080);

        let store = StoreConfig::default();
        assert_eq!(store.backend, StoreBackend::Memory);

        let pager = PagerConfig::default();
        assert_eq!(pager.backend, PagerBackend::None);
        assert_eq!(pager.timeout_secs, 10);

        assert_eq!(EngineConfig::default().op_timeout_ms, 5000);
    }

    #[test]
    fn sanitized_config_redacts_secrets() {
        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::Jwt,
                secret: Some("hush".to_string()),
            },
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            pager: PagerConfig {
                backend: PagerBackend::Http,
                url: Some("http://gateway".to_string()),
                from: Some("+3545551000".to_string()),
                auth_token: Some("also-hush".to_string()),
                timeout_secs: 10,
            },
            engine: EngineConfig::default(),
        };

        let json = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap();
        assert!(!json.contains("hush"));
        assert!(json.contains("http://gateway"));
    }
}
