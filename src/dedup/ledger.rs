use std::collections::HashSet;

use sha1::{Digest, Sha1};

use crate::extract::field_spec::Record;

/// Separator between key values; not expected inside on-screen text.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Derive the dedup fingerprint of `record` from `key_fields`, in order.
///
/// Missing fields count as empty. Returns an empty string when every key
/// value is empty, so such records can be rejected.
pub fn fingerprint(record: &Record, key_fields: &[String]) -> String {
    let parts: Vec<&str> = key_fields
        .iter()
        .map(|k| record.get(k).unwrap_or("").trim())
        .collect();

    if parts.iter().all(|p| p.is_empty()) {
        return String::new();
    }

    let mut sep = [0u8; 4];
    parts.join(KEY_SEPARATOR.encode_utf8(&mut sep))
}

fn digest(fingerprint: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(fingerprint.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Duplicate,
    /// All key fields empty; nothing to dedupe on
    EmptyKey,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

/// Set of fingerprints seen during one run.
///
/// Only grows; a run is bounded so there is no eviction. Entries are SHA-1
/// digests of the fingerprint to keep each one fixed-size.
#[derive(Debug, Clone)]
pub struct DedupLedger {
    key_fields: Vec<String>,
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new(key_fields: Vec<String>) -> Self {
        Self {
            key_fields,
            seen: HashSet::new(),
        }
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn fingerprint(&self, record: &Record) -> String {
        fingerprint(record, &self.key_fields)
    }

    pub fn admit(&mut self, record: &Record) -> Admission {
        let fp = self.fingerprint(record);
        if fp.is_empty() {
            return Admission::EmptyKey;
        }
        if self.seen.insert(digest(&fp)) {
            Admission::Admitted
        } else {
            Admission::Duplicate
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
