// Configuration structs

use serde::Deserialize;

/// Default address of the automation API
pub const DEFAULT_BASE_URL: &str = "http://localhost:8283";

/// Top-level config file layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
}

/// Settings for talking to the automation API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base address, e.g. "http://localhost:8283"
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout; none when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
