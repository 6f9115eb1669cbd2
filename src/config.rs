//! Environment-sourced configuration for the Elasticsearch backend.

/// Connection settings read from the process environment.
///
/// Mirrors the three keys the original storage plugin loads from its config
/// file (`ES_ADDRESSES`, `ES_USER`, `ES_PASSWORD`): a list of node addresses
/// and optional basic-auth credentials.
#[derive(Debug, Clone, Default)]
pub struct EsStorageConfig {
    pub addresses: Vec<String>,
    pub username: String,
    pub password: String,
}

impl EsStorageConfig {
    /// Loads configuration from `ES_ADDRESSES` (comma-separated), `ES_USER`,
    /// and `ES_PASSWORD`. Missing variables default to empty.
    pub fn from_env() -> Self {
        let addresses = std::env::var("ES_ADDRESSES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let username = std::env::var("ES_USER").unwrap_or_default();
        let password = std::env::var("ES_PASSWORD").unwrap_or_default();

        Self {
            addresses,
            username,
            password,
        }
    }

    /// Credentials are only attached to the transport when a username was
    /// configured, matching the original's `genESCfg`.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}
