use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process tables, optionally seeded from a JSON file.
    #[default]
    Memory,
    /// Remote store behind a JSON gateway.
    Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    #[serde(default)]
    pub endpoint: Option<String>,

    /// Skip TLS certificate verification for the gateway endpoint.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub table: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum entries per range read, 0 for no limit.
    #[serde(default)]
    pub range_limit: u64,

    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            endpoint: None,
            insecure: false,
            table: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            range_limit: 0,
            seed_file: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn range_limit(&self) -> Option<u64> {
        (self.range_limit > 0).then_some(self.range_limit)
    }
}

fn default_request_timeout_ms() -> u64 {
    1000
}
