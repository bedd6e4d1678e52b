use super::RecordType;
use std::fmt;

const KEY_SEPARATOR: char = '/';
const TYPE_SEPARATOR: char = '#';

/// Lowercases a domain name and strips its trailing root dot.
pub fn normalize_name(name: &str) -> String {
    let name = name.strip_suffix('.').unwrap_or(name);
    name.to_ascii_lowercase()
}

/// Storage key of a domain name.
///
/// Labels are reversed and joined with `/` under a leading `/`, so
/// `api.example.com.` becomes `/com/example/api` and the root becomes `/`.
/// Every name below a domain shares that domain's key as a prefix.
///
/// Labels are host-name labels; they never contain `/` or `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KvKey(String);

impl KvKey {
    pub fn from_name(name: &str) -> Self {
        let normalized = normalize_name(name);
        let mut key = String::with_capacity(normalized.len() + 1);
        for label in normalized.rsplit('.').filter(|l| !l.is_empty()) {
            key.push(KEY_SEPARATOR);
            key.push_str(label);
        }
        if key.is_empty() {
            key.push(KEY_SEPARATOR);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Key of the single record of `record_type` stored at this name: `key#A`.
    pub fn typed(&self, record_type: RecordType) -> String {
        format!("{}{}{}", self.0, TYPE_SEPARATOR, record_type)
    }

    /// Prefix of the sub-records of `record_type` at this name: `key#A#`.
    pub fn typed_prefix(&self, record_type: RecordType) -> String {
        format!("{}{}", self.typed(record_type), TYPE_SEPARATOR)
    }

    /// Prefix shared by records of every type at this name: `key#`.
    pub fn records_prefix(&self) -> String {
        format!("{}{}", self.0, TYPE_SEPARATOR)
    }

    /// Prefix shared by every name below this one: `key/`.
    pub fn children_prefix(&self) -> String {
        if self.is_root() {
            self.0.clone()
        } else {
            format!("{}{}", self.0, KEY_SEPARATOR)
        }
    }
}

impl fmt::Display for KvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
