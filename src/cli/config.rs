use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::device::accessor::Locator;
use crate::extract::field_spec::FieldSpec;
use crate::output::json::JsonFileSink;
use crate::spider::config::{
    self, ConfigError, SpiderConfig, DEFAULT_MAX_EMPTY_ROUNDS, DEFAULT_TARGET, DEFAULT_TITLE,
};
use crate::spider::scroll::ScrollConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "app-spider",
    version,
    about = "Scrape list data from a mobile app by driving its UI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect, launch the app and scrape until a stop condition fires
    Run {
        /// Path to the spider YAML file
        #[arg(short, long)]
        config: String,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Validate a spider file and print the resolved plan
    Check {
        /// Path to the spider YAML file
        #[arg(short, long)]
        config: String,
    },

    /// Summarize a saved JSON output
    Show {
        /// JSON file written by a previous run
        path: PathBuf,

        /// Most frequent values to list per field
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

/// Command-line values that take precedence over the spider file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunOverrides {
    /// Record target
    #[arg(long)]
    pub target: Option<usize>,

    /// Directory for the output file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Fixed output file name instead of the timestamped one
    #[arg(long)]
    pub output_file: Option<String>,

    /// Append a JSONL round trace to this file
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Bridge command line, e.g. "python3 u2_bridge.py"
    #[arg(long)]
    pub bridge: Option<String>,
}

// ============================================================================
// Spider File Model (YAML)
// ============================================================================

/// A spider definition: `spider.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiderFile {
    /// Package id of the app to drive
    pub package: String,

    #[serde(default = "default_title")]
    pub title: String,

    /// Field name → locator, in output order
    pub fields: FieldSpec,

    #[serde(default)]
    pub container: Option<Locator>,

    #[serde(default)]
    pub key_fields: Vec<String>,

    #[serde(default = "default_target")]
    pub target: usize,

    /// Seconds to wait after each scroll
    #[serde(default = "default_settle_delay")]
    pub settle_delay: f64,

    #[serde(default = "default_max_empty_rounds")]
    pub max_empty_rounds: usize,

    /// Seconds to wait after starting the app
    #[serde(default = "default_launch_wait")]
    pub launch_wait: f64,

    #[serde(default)]
    pub scroll: ScrollConfig,

    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub output_file: Option<String>,

    #[serde(default)]
    pub trace: Option<PathBuf>,

    /// Device bridge command; speaks the NDJSON protocol described on
    /// `device::session::BridgeRequest`
    #[serde(default = "default_bridge")]
    pub bridge: Vec<String>,
}

// Serde default helpers
fn default_title() -> String { DEFAULT_TITLE.to_string() }
fn default_target() -> usize { DEFAULT_TARGET }
fn default_settle_delay() -> f64 { 2.5 }
fn default_max_empty_rounds() -> usize { DEFAULT_MAX_EMPTY_ROUNDS }
fn default_launch_wait() -> f64 { 3.0 }
fn default_output_prefix() -> String { "data".to_string() }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_bridge() -> Vec<String> { vec!["python3".into(), "u2_bridge.py".into()] }

impl SpiderFile {
    pub fn apply(&mut self, overrides: &RunOverrides) {
        if let Some(target) = overrides.target {
            self.target = target;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(file) = &overrides.output_file {
            self.output_file = Some(file.clone());
        }
        if let Some(trace) = &overrides.trace {
            self.trace = Some(trace.clone());
        }
        if let Some(bridge) = &overrides.bridge {
            self.bridge = bridge.split_whitespace().map(String::from).collect();
        }
    }

    /// Build and validate the run configuration.
    pub fn to_config(&self) -> Result<SpiderConfig, ConfigError> {
        let mut cfg = SpiderConfig::new(self.package.clone(), self.fields.clone())
            .with_title(self.title.clone())
            .with_key_fields(self.key_fields.clone())
            .with_target(self.target)
            .with_settle_delay(config::seconds("settle_delay", self.settle_delay)?)
            .with_max_empty_rounds(self.max_empty_rounds)
            .with_launch_wait(config::seconds("launch_wait", self.launch_wait)?);
        cfg.container = self.container.clone();
        cfg.scroll = self.scroll;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn sink(&self) -> JsonFileSink {
        let sink = JsonFileSink::new(self.output_dir.clone(), self.output_prefix.clone());
        match &self.output_file {
            Some(name) => sink.with_file_name(name.clone()),
            None => sink,
        }
    }
}

// ============================================================================
// Spider File Loading
// ============================================================================

pub fn parse_spider_file(content: &str, path: &str) -> Result<SpiderFile, ConfigError> {
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

pub fn load_spider_file(path: &str) -> Result<SpiderFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    parse_spider_file(&content, path)
}
