use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::device::accessor::Locator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldSpecError {
    #[error("field spec must declare at least one field")]
    Empty,

    #[error("field name must not be blank")]
    BlankName,

    #[error("field '{0}' is declared more than once")]
    Duplicate(String),
}

// ============================================================================
// FieldSpec: ordered field name → locator mapping
// ============================================================================

/// Ordered mapping from field name to the locator that finds it.
///
/// The first field is the primary field: it anchors positional extraction,
/// is the default dedup key, and labels the record count in reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    fields: Vec<(String, Locator)>,
}

impl FieldSpec {
    pub fn new<N, L>(fields: impl IntoIterator<Item = (N, L)>) -> Result<Self, FieldSpecError>
    where
        N: Into<String>,
        L: Into<Locator>,
    {
        let mut out: Vec<(String, Locator)> = Vec::new();
        for (name, locator) in fields {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(FieldSpecError::BlankName);
            }
            if out.iter().any(|(n, _)| *n == name) {
                return Err(FieldSpecError::Duplicate(name));
            }
            out.push((name, locator.into()));
        }
        if out.is_empty() {
            return Err(FieldSpecError::Empty);
        }
        Ok(Self { fields: out })
    }

    pub fn primary(&self) -> &str {
        // Construction guarantees at least one entry
        &self.fields[0].0
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Locator)> {
        self.fields.iter().map(|(n, l)| (n.as_str(), l))
    }
}

impl Serialize for FieldSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, locator) in &self.fields {
            map.serialize_entry(name, locator)?;
        }
        map.end()
    }
}

struct FieldSpecVisitor;

impl<'de> Visitor<'de> for FieldSpecVisitor {
    type Value = FieldSpec;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of field name to locator")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSpec, A::Error> {
        let mut entries: Vec<(String, Locator)> = Vec::new();
        while let Some((name, locator)) = access.next_entry::<String, Locator>()? {
            entries.push((name, locator));
        }
        FieldSpec::new(entries).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FieldSpecVisitor)
    }
}

// ============================================================================
// Record: one extracted list item
// ============================================================================

/// Field name → extracted text, in field spec order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// At least one field carries non-blank text.
    pub fn has_content(&self) -> bool {
        self.values.iter().any(|(_, v)| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (n, v) in iter {
            record.insert(n, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of field name to text")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((name, value)) = access.next_entry::<String, String>()? {
            record.insert(name, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}
