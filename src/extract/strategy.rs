use std::fmt;

use tracing::{debug, warn};

use crate::dedup::ledger::{Admission, DedupLedger};
use crate::device::accessor::{Locator, ViewAccessor};
use crate::device::error::DeviceError;
use crate::extract::field_spec::{FieldSpec, Record};

/// How fields are paired into records. Chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Resolve fields only inside each container element.
    Structural(Locator),
    /// Pair the i-th match of every field into record i.
    Positional,
}

impl Strategy {
    pub fn from_container(container: Option<Locator>) -> Self {
        match container {
            Some(locator) => Strategy::Structural(locator),
            None => Strategy::Positional,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Structural(_) => "structural",
            Strategy::Positional => "positional",
        }
    }
}

/// Non-fatal conditions noticed while extracting one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Container locator matched nothing; likely a configuration problem
    NoContainers { locator: Locator },
    /// Primary field matched nothing, so positional indices have no anchor
    PrimaryMissing { field: String },
    /// Fields matched different counts; output truncated to `safe`
    CountMismatch {
        counts: Vec<(String, usize)>,
        safe: usize,
    },
    /// A whole-field query failed and was treated as zero matches
    FieldQueryFailed { field: String, error: String },
    /// One field of one item could not be read and was left empty
    ElementSkipped {
        index: usize,
        field: String,
        error: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoContainers { locator } => {
                write!(f, "no container found for '{}', check configuration", locator)
            }
            Diagnostic::PrimaryMissing { field } => {
                write!(f, "primary field '{}' not found", field)
            }
            Diagnostic::CountMismatch { counts, safe } => {
                let parts: Vec<String> = counts
                    .iter()
                    .map(|(name, n)| format!("{}={}", name, n))
                    .collect();
                write!(
                    f,
                    "field counts differ ({}); reading {} items, some data may be truncated",
                    parts.join(", "),
                    safe
                )
            }
            Diagnostic::FieldQueryFailed { field, error } => {
                write!(f, "query for field '{}' failed: {}", field, error)
            }
            Diagnostic::ElementSkipped {
                index,
                field,
                error,
            } => {
                write!(f, "item {} field '{}' skipped: {}", index, field, error)
            }
        }
    }
}

/// Output of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct RoundExtraction {
    /// Newly admitted records, in screen order
    pub records: Vec<Record>,
    /// Records with content offered to the ledger
    pub candidates: usize,
    pub duplicates: usize,
    pub empty_keys: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RoundExtraction {
    fn note(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn offer(&mut self, record: Record, ledger: &mut DedupLedger) {
        if !record.has_content() {
            return;
        }
        self.candidates += 1;
        match ledger.admit(&record) {
            Admission::Admitted => self.records.push(record),
            Admission::Duplicate => self.duplicates += 1,
            Admission::EmptyKey => self.empty_keys += 1,
        }
    }

    /// Keep going on a recoverable error, recording where it happened.
    fn absorb(
        &mut self,
        err: DeviceError,
        index: usize,
        field: &str,
    ) -> Result<String, DeviceError> {
        if err.is_fatal() {
            return Err(err);
        }
        self.note(Diagnostic::ElementSkipped {
            index,
            field: field.to_string(),
            error: err.to_string(),
        });
        Ok(String::new())
    }
}

/// Extract the records visible on the current screen.
///
/// Candidates pass through `ledger`; only admitted records are returned.
/// Errors are returned only when the device is unusable or, for the
/// structural strategy, when the container query itself fails.
pub fn extract_round<A>(
    accessor: &mut A,
    strategy: &Strategy,
    fields: &FieldSpec,
    ledger: &mut DedupLedger,
) -> Result<RoundExtraction, DeviceError>
where
    A: ViewAccessor + ?Sized,
{
    match strategy {
        Strategy::Structural(container) => extract_structural(accessor, container, fields, ledger),
        Strategy::Positional => extract_positional(accessor, fields, ledger),
    }
}

fn element_text<A>(accessor: &mut A, element: &A::Element) -> Result<String, DeviceError>
where
    A: ViewAccessor + ?Sized,
{
    if !accessor.exists(element)? {
        return Ok(String::new());
    }
    Ok(accessor.text(element)?.trim().to_string())
}

fn child_text<A>(
    accessor: &mut A,
    container: &A::Element,
    locator: &Locator,
) -> Result<String, DeviceError>
where
    A: ViewAccessor + ?Sized,
{
    match accessor.find_child(container, locator)? {
        Some(element) => element_text(accessor, &element),
        None => Ok(String::new()),
    }
}

fn extract_structural<A>(
    accessor: &mut A,
    container: &Locator,
    fields: &FieldSpec,
    ledger: &mut DedupLedger,
) -> Result<RoundExtraction, DeviceError>
where
    A: ViewAccessor + ?Sized,
{
    let mut out = RoundExtraction::default();

    let containers = accessor.find(container)?;
    if containers.is_empty() {
        out.note(Diagnostic::NoContainers {
            locator: container.clone(),
        });
        return Ok(out);
    }
    debug!(count = containers.len(), "containers found");

    for (index, element) in containers.iter().enumerate() {
        let mut record = Record::new();
        for (name, locator) in fields.iter() {
            let value = match child_text(accessor, element, locator) {
                Ok(text) => text,
                Err(e) => out.absorb(e, index, name)?,
            };
            record.insert(name, value);
        }
        out.offer(record, ledger);
    }

    Ok(out)
}

fn extract_positional<A>(
    accessor: &mut A,
    fields: &FieldSpec,
    ledger: &mut DedupLedger,
) -> Result<RoundExtraction, DeviceError>
where
    A: ViewAccessor + ?Sized,
{
    let mut out = RoundExtraction::default();

    // One query per field; indexing into these avoids re-querying per item
    let mut columns: Vec<(&str, Vec<A::Element>)> = Vec::with_capacity(fields.len());
    for (name, locator) in fields.iter() {
        let elements = match accessor.find(locator) {
            Ok(elements) => elements,
            Err(e) if !e.is_fatal() => {
                out.note(Diagnostic::FieldQueryFailed {
                    field: name.to_string(),
                    error: e.to_string(),
                });
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        columns.push((name, elements));
    }

    let counts: Vec<(String, usize)> = columns
        .iter()
        .map(|(name, elements)| (name.to_string(), elements.len()))
        .collect();
    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if max == 0 {
        return Ok(out);
    }

    if counts[0].1 == 0 {
        out.note(Diagnostic::PrimaryMissing {
            field: fields.primary().to_string(),
        });
        return Ok(out);
    }

    let safe = counts.iter().map(|(_, n)| *n).min().unwrap_or(0);
    if safe != max {
        out.note(Diagnostic::CountMismatch {
            counts: counts.clone(),
            safe,
        });
    }

    for index in 0..safe {
        let mut record = Record::new();
        for (name, elements) in &columns {
            let value = match element_text(accessor, &elements[index]) {
                Ok(text) => text,
                Err(e) => out.absorb(e, index, name)?,
            };
            record.insert(*name, value);
        }
        out.offer(record, ledger);
    }

    Ok(out)
}
