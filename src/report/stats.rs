use std::collections::HashMap;

use serde::Serialize;

use crate::extract::field_spec::Record;
use crate::spider::session::RunOutcome;

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub outcome: RunOutcome,

    /// Label for the record count, e.g. "job title"
    pub primary_field: String,

    pub rounds: usize,
    pub total_records: usize,

    /// Fingerprints remembered by the ledger
    pub unique_fingerprints: usize,

    /// Distinct non-empty values per dedup key field
    pub distinct_key_values: Vec<(String, usize)>,

    pub elapsed_ms: u128,
}

impl RunStats {
    pub fn compute(
        outcome: RunOutcome,
        primary_field: &str,
        rounds: usize,
        records: &[Record],
        unique_fingerprints: usize,
        key_fields: &[String],
        elapsed_ms: u128,
    ) -> Self {
        let distinct_key_values = key_fields
            .iter()
            .map(|k| (k.clone(), distinct_values(records, k)))
            .collect();

        Self {
            outcome,
            primary_field: primary_field.to_string(),
            rounds,
            total_records: records.len(),
            unique_fingerprints,
            distinct_key_values,
            elapsed_ms,
        }
    }
}

/// Number of distinct non-empty values of `field`.
pub fn distinct_values(records: &[Record], field: &str) -> usize {
    let mut seen: Vec<&str> = records
        .iter()
        .filter_map(|r| r.get(field))
        .filter(|v| !v.is_empty())
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Most frequent non-empty values of `field`, highest count first.
///
/// Ties are ordered by value so output is stable.
pub fn top_values(records: &[Record], field: &str, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in records.iter().filter_map(|r| r.get(field)) {
        if !value.is_empty() {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(v, c)| (v.to_string(), c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Per-field fill and spread, for inspecting a saved output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub filled: usize,
    pub distinct: usize,
    pub top: Vec<(String, usize)>,
}

pub fn summarize_fields(records: &[Record], top: usize) -> Vec<FieldSummary> {
    let mut fields: Vec<&str> = Vec::new();
    for record in records {
        for (name, _) in record.iter() {
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
    }

    fields
        .into_iter()
        .map(|field| FieldSummary {
            field: field.to_string(),
            filled: records
                .iter()
                .filter(|r| r.get(field).is_some_and(|v| !v.is_empty()))
                .count(),
            distinct: distinct_values(records, field),
            top: top_values(records, field, top),
        })
        .collect()
}
