/// A raw entry returned by the key-value backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

/// The set of keys a single read touches, in byte-lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRange {
    /// Exactly one key.
    Exact(Vec<u8>),
    /// Half-open range `[start, end)`.
    Bounded { start: Vec<u8>, end: Vec<u8> },
    /// Every key greater than or equal to `start`.
    From(Vec<u8>),
}

impl KeyRange {
    pub fn exact(key: impl Into<Vec<u8>>) -> Self {
        KeyRange::Exact(key.into())
    }

    /// All keys having `prefix` as a prefix.
    ///
    /// Falls back to an open-ended scan when the prefix has no finite
    /// upper bound (empty, or all `0xFF`).
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        let start = prefix.into();
        match next_prefix(&start) {
            Some(end) => KeyRange::Bounded { start, end },
            None => KeyRange::From(start),
        }
    }

    pub fn start(&self) -> &[u8] {
        match self {
            KeyRange::Exact(key) => key,
            KeyRange::Bounded { start, .. } => start,
            KeyRange::From(start) => start,
        }
    }

    /// Exclusive upper bound, `None` for exact and open-ended ranges.
    pub fn end(&self) -> Option<&[u8]> {
        match self {
            KeyRange::Bounded { end, .. } => Some(end),
            _ => None,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        match self {
            KeyRange::Exact(k) => k.as_slice() == key,
            KeyRange::Bounded { start, end } => start.as_slice() <= key && key < end.as_slice(),
            KeyRange::From(start) => start.as_slice() <= key,
        }
    }
}

/// Exclusive upper bound of a prefix scan.
///
/// Scanning from the last byte, the first byte below `0xFF` is incremented and
/// every trailing `0xFF` byte after it is reset to `0x00`. Returns `None` when
/// every byte is `0xFF` (the empty input included): such a prefix has no
/// finite bound and must be scanned to the end of the keyspace.
pub fn next_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let pos = prefix.iter().rposition(|&b| b < u8::MAX)?;
    let mut end = prefix.to_vec();
    end[pos] += 1;
    for b in &mut end[pos + 1..] {
        *b = 0;
    }
    Some(end)
}
