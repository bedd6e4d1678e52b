use crate::{Fallthrough, Zones};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How names are looked up in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// One transaction per query: the record of the queried type, its typed
    /// sub-records, and existence checks, read from one snapshot.
    #[default]
    Typed,
    /// One range read of everything stored at or below the name.
    Flat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Zones answered from the backend. Queries outside them go to the next handler.
    #[serde(default)]
    pub zones: Vec<String>,

    /// `None` disables fallthrough; an empty list enables it for every name.
    #[serde(default)]
    pub fallthrough: Option<Vec<String>>,

    #[serde(default)]
    pub lookup: LookupMode,

    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    #[serde(default = "default_min_ttl")]
    pub min_ttl: u32,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Resolvers used to chase CNAME targets outside the served zones.
    #[serde(default)]
    pub upstream: Vec<String>,

    /// Resolvers queries are forwarded to when this handler passes them on.
    #[serde(default)]
    pub forward: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            fallthrough: None,
            lookup: LookupMode::default(),
            default_ttl: default_ttl(),
            min_ttl: default_min_ttl(),
            query_timeout_ms: default_query_timeout_ms(),
            upstream: Vec::new(),
            forward: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn zones(&self) -> Zones {
        Zones::new(&self.zones)
    }

    pub fn fallthrough(&self) -> Fallthrough {
        match &self.fallthrough {
            None => Fallthrough::Disabled,
            Some(zones) => Fallthrough::from_zones(zones),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn default_ttl() -> u32 {
    300
}

fn default_min_ttl() -> u32 {
    30
}

fn default_query_timeout_ms() -> u64 {
    2000
}
