//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use nommer_infra::DEFAULT_STORE_TIMEOUT;

pub const BIND_ADDR_ENV: &str = "NOMMER_BIND_ADDR";
pub const STORE_TIMEOUT_ENV: &str = "NOMMER_STORE_TIMEOUT_SECS";
pub const USE_PERSISTENT_STORES_ENV: &str = "USE_PERSISTENT_STORES";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Which project store backs the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub store_timeout: Duration,
    pub store: StoreBackend,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: BIND_ADDR_ENV,
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let store_timeout = match lookup(STORE_TIMEOUT_ENV) {
            None => DEFAULT_STORE_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: STORE_TIMEOUT_ENV,
                        value: raw,
                        reason: "must be at least 1 second".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: STORE_TIMEOUT_ENV,
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        let use_persistent = match lookup(USE_PERSISTENT_STORES_ENV) {
            None => false,
            Some(raw) => raw.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
                var: USE_PERSISTENT_STORES_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };

        let store = if use_persistent {
            let database_url = lookup(DATABASE_URL_ENV)
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing(DATABASE_URL_ENV))?;
            StoreBackend::Postgres { database_url }
        } else {
            StoreBackend::InMemory
        };

        Ok(Self {
            bind_addr,
            store_timeout,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_to_in_memory_on_localhost() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.store_timeout, DEFAULT_STORE_TIMEOUT);
        assert_eq!(cfg.store, StoreBackend::InMemory);
    }

    #[test]
    fn persistent_store_requires_database_url() {
        assert_eq!(
            config(&[(USE_PERSISTENT_STORES_ENV, "true")]),
            Err(ConfigError::Missing(DATABASE_URL_ENV))
        );

        let cfg = config(&[
            (USE_PERSISTENT_STORES_ENV, "true"),
            (DATABASE_URL_ENV, "postgres://localhost/nommer"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/nommer".to_string()
            }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[(BIND_ADDR_ENV, "not-an-addr")]),
            Err(ConfigError::Invalid { var: BIND_ADDR_ENV, .. })
        ));
        assert!(matches!(
            config(&[(STORE_TIMEOUT_ENV, "0")]),
            Err(ConfigError::Invalid { var: STORE_TIMEOUT_ENV, .. })
        ));
        assert!(matches!(
            config(&[(STORE_TIMEOUT_ENV, "ten")]),
            Err(ConfigError::Invalid { var: STORE_TIMEOUT_ENV, .. })
        ));
        assert!(matches!(
            config(&[(USE_PERSISTENT_STORES_ENV, "yes")]),
            Err(ConfigError::Invalid { var: USE_PERSISTENT_STORES_ENV, .. })
        ));
    }

    #[test]
    fn custom_timeout_and_bind_addr() {
        let cfg = config(&[(BIND_ADDR_ENV, "0.0.0.0:9000"), (STORE_TIMEOUT_ENV, "3")]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.store_timeout, Duration::from_secs(3));
    }
}
