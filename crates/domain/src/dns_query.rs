use super::{KvKey, RecordType};
use std::sync::Arc;

/// One query as seen by the resolver: the name, its type and the zone it
/// matched. Built once per request and never mutated.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub zone: Arc<str>,
}

impl QueryDescriptor {
    pub fn new(
        name: impl Into<Arc<str>>,
        record_type: RecordType,
        zone: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            zone: zone.into(),
        }
    }

    pub fn key(&self) -> KvKey {
        KvKey::from_name(&self.name)
    }
}
