use super::{types::Config, AuthMethod, ConfigError, PagerBackend, StoreBackend};

/// Validate configuration cross-field requirements:
/// - Server port is not 0
/// - jwt auth requires a secret
/// - sqlite store requires a path
/// - http pager requires url and from
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Jwt
        && config.auth.secret.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::Invalid(
            "auth.secret must be set when auth.method = \"jwt\"".to_string(),
        ));
    }

    if config.store.backend == StoreBackend::Sqlite && config.store.path.is_none() {
        return Err(ConfigError::Invalid(
            "store.path must be set when store.backend = \"sqlite\"".to_string(),
        ));
    }

    if config.pager.backend == PagerBackend::Http {
        if config.pager.url.is_none() {
            return Err(ConfigError::Invalid(
                "pager.url must be set when pager.backend = \"http\"".to_string(),
            ));
        }
        if config.pager.from.is_none() {
            return Err(ConfigError::Invalid(
                "pager.from must be set when pager.backend = \"http\"".to_string(),
            ));
        }
    }

    if config.engine.op_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "engine.op_timeout_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}
