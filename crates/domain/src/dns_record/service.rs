use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Service record stored as the value of a key.
///
/// The JSON layout is the SkyDNS/CoreDNS `msg.Service` one; `address` is
/// accepted as an alias of `host`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ServiceRecord {
    #[serde(default, alias = "address")]
    pub host: String,

    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub priority: u16,

    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub weight: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mail: bool,

    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub ttl: u32,

    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub targetstrip: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    /// Storage key the record was read from; never part of the stored value.
    #[serde(skip)]
    pub key: String,
}

/// What a record's `host` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKind {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
    /// A domain name, answered as a CNAME.
    Name(String),
}

impl ServiceRecord {
    pub fn from_json(key: &str, value: &[u8]) -> Result<Self, serde_json::Error> {
        let mut record: ServiceRecord = serde_json::from_slice(value)?;
        record.key = key.to_string();
        Ok(record)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// `None` for an empty host.
    pub fn host_kind(&self) -> Option<HostKind> {
        let host = self.host.trim();
        if host.is_empty() {
            return None;
        }
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => Some(HostKind::V4(v4)),
            Ok(IpAddr::V6(v6)) => Some(HostKind::V6(v6)),
            Err(_) => Some(HostKind::Name(host.trim_end_matches('.').to_ascii_lowercase())),
        }
    }

    /// Record TTL, `default_ttl` when the stored record leaves it unset.
    pub fn ttl_or(&self, default_ttl: u32) -> u32 {
        if self.ttl == 0 {
            default_ttl
        } else {
            self.ttl
        }
    }
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}
