use arc_swap::ArcSwap;
use async_trait::async_trait;
use kvdns_application::ports::{KvStore, RangeRequest, RangeResponse, TxnRequest, TxnResponse};
use kvdns_domain::{BackendError, DomainError, KeyRange, KeyValue};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type Table = BTreeMap<Vec<u8>, Vec<u8>>;
type Tables = HashMap<String, Arc<Table>>;

/// In-process key-value backend.
///
/// Readers load an immutable snapshot of every table; writers publish a new
/// snapshot, copying only the table they touch. A transaction therefore sees
/// one consistent state no matter how writes interleave with it.
pub struct MemoryKvStore {
    tables: ArcSwap<Tables>,
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            tables: ArcSwap::from_pointee(Tables::new()),
        }
    }

    /// Loads a JSON seed of the form `{"<table>": {"<key>": <record>}}`.
    /// Records are stored re-serialized, one value per key.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DomainError::IoError(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_seed_json(&contents)?;
        info!(path = %path.display(), tables = store.table_names().len(), "Seed file loaded");
        Ok(store)
    }

    pub fn from_seed_json(contents: &str) -> Result<Self, DomainError> {
        let seed: HashMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_str(contents)
                .map_err(|e| DomainError::ConfigError(format!("invalid seed file: {}", e)))?;

        let mut tables = Tables::new();
        for (name, entries) in seed {
            let mut table = Table::new();
            for (key, record) in entries {
                let value = serde_json::to_vec(&record)
                    .map_err(|e| DomainError::ConfigError(format!("invalid record {}: {}", key, e)))?;
                table.insert(key.into_bytes(), value);
            }
            tables.insert(name, Arc::new(table));
        }

        Ok(Self {
            tables: ArcSwap::from_pointee(tables),
        })
    }

    pub fn put(&self, table: &str, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        self.tables.rcu(|tables| {
            let mut next = Tables::clone(tables);
            let entries = next.entry(table.to_string()).or_default();
            Arc::make_mut(entries).insert(key.clone(), value.clone());
            next
        });
    }

    pub fn delete(&self, table: &str, key: &[u8]) -> bool {
        let mut removed = false;
        self.tables.rcu(|tables| {
            let mut next = Tables::clone(tables);
            removed = match next.get_mut(table) {
                Some(entries) if entries.contains_key(key) => {
                    Arc::make_mut(entries).remove(key);
                    true
                }
                _ => false,
            };
            next
        });
        removed
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.load().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.load().get(table).map_or(0, |t| t.len())
    }

    fn snapshot(&self, table: &str) -> Result<Arc<Table>, BackendError> {
        self.tables
            .load()
            .get(table)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("table {} not found", table)))
    }
}

fn read(table: &Table, range: &KeyRange, limit: Option<u64>, keys_only: bool) -> RangeResponse {
    let entries: Box<dyn Iterator<Item = (&Vec<u8>, &Vec<u8>)> + '_> = match range {
        KeyRange::Exact(key) => Box::new(table.get_key_value(key.as_slice()).into_iter()),
        KeyRange::Bounded { start, end } if start < end => Box::new(table.range::<[u8], _>((
            Bound::Included(start.as_slice()),
            Bound::Excluded(end.as_slice()),
        ))),
        KeyRange::Bounded { .. } => Box::new(std::iter::empty()),
        KeyRange::From(start) => Box::new(
            table.range::<[u8], _>((Bound::Included(start.as_slice()), Bound::Unbounded)),
        ),
    };

    let mut kvs = Vec::new();
    let mut more = false;
    for (key, value) in entries {
        if limit.is_some_and(|limit| kvs.len() as u64 >= limit) {
            more = true;
            break;
        }
        let value = if keys_only { Vec::new() } else { value.clone() };
        kvs.push(KeyValue::new(key.clone(), value));
    }

    RangeResponse { kvs, more }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn range(&self, request: RangeRequest) -> Result<RangeResponse, BackendError> {
        let table = self.snapshot(&request.table)?;
        let response = read(&table, &request.range, request.limit, request.keys_only);
        if response.kvs.is_empty() {
            return Err(BackendError::not_found("key not found"));
        }
        Ok(response)
    }

    async fn txn(&self, request: TxnRequest) -> Result<TxnResponse, BackendError> {
        let table = self.snapshot(&request.table)?;
        let responses = request
            .ops
            .iter()
            .map(|op| read(&table, &op.range, op.limit, op.keys_only))
            .collect();
        Ok(TxnResponse { responses })
    }
}
