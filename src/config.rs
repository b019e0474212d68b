//! Service configuration.
//!
//! Loaded with [Figment] from three layers, highest priority first:
//!
//! | Priority | Source | Example |
//! |----------|--------|---------|
//! | 1 | `PIVOTSQL_*` env vars (`__` separates nested keys) | `PIVOTSQL_ADHOC__DEFAULT_LIMIT=500` |
//! | 2 | TOML file passed to [`ServiceConfig::load`] | `query_timeout = 60` |
//! | 3 | [`ServiceConfig::default`] | |

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::resolver::FieldAnchoring;

pub const ENV_PREFIX: &str = "PIVOTSQL_";

/// Default number of rows an ad-hoc query returns when no limit is given.
pub const DEFAULT_ADHOC_LIMIT: u64 = 1000;

/// Upper bound applied to any requested ad-hoc limit.
pub const DEFAULT_ADHOC_MAX_LIMIT: u64 = 10_000;

/// Default wall-clock budget for one query execution (30 seconds).
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Figment(#[source] Box<figment::Error>),
}

/// Deployment mode; production hides rendered SQL from responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub environment: Environment,
    /// Seconds before an executing query is cancelled
    pub query_timeout: u64,
    pub anchoring: FieldAnchoring,
    pub adhoc: AdhocConfig,
    pub pool: PoolSettings,
    pub http: HttpSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            anchoring: FieldAnchoring::default(),
            adhoc: AdhocConfig::default(),
            pool: PoolSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdhocConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for AdhocConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_ADHOC_LIMIT,
            max_limit: DEFAULT_ADHOC_MAX_LIMIT,
        }
    }
}

/// Connection pool lifecycle; the size comes from each data source.
///
/// | Field | Default |
/// |-------|---------|
/// | `acquire_timeout` | 5 s |
/// | `idle_timeout` | 10 min |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub acquire_timeout: u64,
    pub idle_timeout: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            acquire_timeout: 5,
            idle_timeout: 600,
        }
    }
}

impl PoolSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Seconds allowed for one API request
    pub timeout: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout: 10 }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl ServiceConfig {
    /// Load from defaults, an optional TOML file, and `PIVOTSQL_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ServiceConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|err| ConfigError::Figment(Box::new(err)))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
