use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tracing::{info, warn};

use crate::extract::field_spec::Record;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error for '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Receives the finished record list at the end of every run.
pub trait RecordSink {
    /// Returns where the records went, or `None` if nothing was written.
    fn persist(&mut self, records: &[Record]) -> Result<Option<PathBuf>, OutputError>;
}

/// `<prefix>_<YYYYMMDD_HHMMSS>.json`
pub fn output_filename<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.json", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Write records as a pretty-printed UTF-8 JSON array, overwriting `path`.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

pub fn read_records(path: &Path) -> Result<Vec<Record>, OutputError> {
    let file = File::open(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves runs as timestamped JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    pub dir: PathBuf,
    pub prefix: String,
    /// Fixed file name used instead of the timestamped one
    pub file_name: Option<String>,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn target_path(&self, now: &DateTime<Local>) -> PathBuf {
        match &self.file_name {
            Some(name) => self.dir.join(name),
            None => self.dir.join(output_filename(&self.prefix, now)),
        }
    }
}

impl RecordSink for JsonFileSink {
    fn persist(&mut self, records: &[Record]) -> Result<Option<PathBuf>, OutputError> {
        if records.is_empty() {
            warn!("no data to save");
            return Ok(None);
        }

        let path = self.target_path(&Local::now());
        write_records(&path, records)?;
        info!(path = %path.display(), count = records.len(), "records saved");
        Ok(Some(path))
    }
}

/// Keeps records in memory; used when the caller persists them itself.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<Record>,
    pub calls: usize,
}

impl RecordSink for MemorySink {
    fn persist(&mut self, records: &[Record]) -> Result<Option<PathBuf>, OutputError> {
        self.calls += 1;
        self.records = records.to_vec();
        Ok(None)
    }
}
