use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::category::HierarchyRules;
use crate::error::CoreResult;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub hierarchy: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// An authenticating proxy in front of the service forwards the user id.
    Proxy,
    /// Every request acts as one fixed user. Local development only.
    SingleUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub proxy: Option<ProxyAuthConfig>,
    pub single_user: Option<SingleUserAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyAuthConfig {
    pub header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleUserAuthConfig {
    pub user_id: String,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
    pub connection_timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct CacheConfig {
    pub url: String,
    pub parents_ttl_secs: u64,
    pub response_timeout_ms: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &redact_credentials(&self.url))
            .field("max_connections", &self.max_connections)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("url", &redact_credentials(&self.url))
            .field("parents_ttl_secs", &self.parents_ttl_secs)
            .field("response_timeout_ms", &self.response_timeout_ms)
            .finish()
    }
}

/// Replaces the user-info part of a connection URL with `***`.
#[must_use]
pub fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// Nested keys use a double underscore, e.g. `DATABASE__URL` or
    /// `CACHE__PARENTS_TTL_SECS`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 8)?
            .set_default("database.connection_timeout_secs", 5)?
            .set_default("cache.url", "redis://127.0.0.1:6379/0")?
            .set_default("cache.parents_ttl_secs", 300)?
            .set_default("cache.response_timeout_ms", 500)?
            .set_default("auth.method", "proxy")?
            .set_default("auth.proxy.header", "X-Authenticated-User")?
            .set_default("logging.level", "info")?
            .set_default("pagination.default_limit", 20)?
            .set_default("pagination.max_limit", 100)?
            // Env file
            .add_source(environment())
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Builds the hierarchy rules, applying any `[hierarchy]` overrides.
    ///
    /// ## Errors
    /// Returns an error if an override names an unknown category or breaks
    /// the hierarchy's structure.
    pub fn hierarchy_rules(&self) -> CoreResult<HierarchyRules> {
        HierarchyRules::with_overrides(&self.hierarchy)
    }
}

/// Environment source. Keys are lowercased and `__` separates sections, so
/// single underscores stay inside multi-word keys.
fn environment() -> config::Environment {
    config::Environment::default()
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
