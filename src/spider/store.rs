use crate::extract::field_spec::Record;

/// Accepted records in admission order. Append-only.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    records: Vec<Record>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, batch: Vec<Record>) {
        self.records.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
