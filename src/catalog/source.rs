//! Data source definitions

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_pool_size() -> u32 {
    10
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// A configured backend that datasets read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: SourceKind,
    /// Maximum pooled connections for relational sources
    #[serde(default = "default_pool_size")]
    pub connection_pool: u32,
    /// Seconds between refreshes, kept for the scheduling collaborator
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Backend kind, tagged by `type` in catalog files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKind {
    Database(DatabaseConfig),
    #[serde(alias = "file")]
    Excel(FileConfig),
    Api(ApiConfig),
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Database(_) => "database",
            SourceKind::Excel(_) => "file",
            SourceKind::Api(_) => "api",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `mysql`, `postgresql`, `sqlite`, `oracle`, `sqlserver`
    pub db_type: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name, or the file path for sqlite
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_method: HttpMethod,
    #[serde(default)]
    pub api_headers: BTreeMap<String, String>,
    /// Query parameters for GET, JSON body for POST
    #[serde(default)]
    pub api_body: Option<serde_json::Value>,
}

impl DataSource {
    pub fn database(&self) -> Option<&DatabaseConfig> {
        match &self.kind {
            SourceKind::Database(db) => Some(db),
            _ => None,
        }
    }
}
