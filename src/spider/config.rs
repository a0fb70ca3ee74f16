use std::time::Duration;

use thiserror::Error;

use crate::device::accessor::Locator;
use crate::extract::field_spec::{FieldSpec, FieldSpecError};
use crate::extract::strategy::Strategy;
use crate::spider::scroll::ScrollConfig;

pub const DEFAULT_TARGET: usize = 100;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2500);
pub const DEFAULT_MAX_EMPTY_ROUNDS: usize = 3;
pub const DEFAULT_LAUNCH_WAIT: Duration = Duration::from_secs(3);
pub const DEFAULT_TITLE: &str = "App Spider";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid field spec: {0}")]
    Fields(#[from] FieldSpecError),

    #[error("key field '{0}' is not a declared field")]
    UnknownKeyField(String),

    #[error("package id must not be empty")]
    EmptyPackage,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must be a finite, non-negative number of seconds (got {value})")]
    BadSeconds { name: &'static str, value: f64 },

    #[error("scroll {name} must be between 0 and 1 (got {value})")]
    BadRatio { name: &'static str, value: f64 },

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Validated settings for one spider run.
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// Package id of the app to drive
    pub package: String,

    /// Shown in the banner and report
    pub title: String,

    pub fields: FieldSpec,

    /// Container locator; selects the structural strategy when set
    pub container: Option<Locator>,

    /// Fields forming the dedup fingerprint; empty means the primary field
    pub key_fields: Vec<String>,

    /// Soft record target; the round that crosses it is kept whole
    pub target: usize,

    /// Wait after each scroll for the list to finish rendering
    pub settle_delay: Duration,

    /// Consecutive rounds without new records before giving up
    pub max_empty_rounds: usize,

    /// Wait after starting the app before checking the foreground
    pub launch_wait: Duration,

    pub scroll: ScrollConfig,
}

impl SpiderConfig {
    pub fn new(package: impl Into<String>, fields: FieldSpec) -> Self {
        Self {
            package: package.into(),
            title: DEFAULT_TITLE.to_string(),
            fields,
            container: None,
            key_fields: Vec::new(),
            target: DEFAULT_TARGET,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_empty_rounds: DEFAULT_MAX_EMPTY_ROUNDS,
            launch_wait: DEFAULT_LAUNCH_WAIT,
            scroll: ScrollConfig::default(),
        }
    }

    pub fn with_container(mut self, container: impl Into<Locator>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_key_fields<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.key_fields = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_max_empty_rounds(mut self, rounds: usize) -> Self {
        self.max_empty_rounds = rounds;
        self
    }

    pub fn with_launch_wait(mut self, wait: Duration) -> Self {
        self.launch_wait = wait;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Key fields with the primary-field default applied.
    pub fn resolved_key_fields(&self) -> Vec<String> {
        if self.key_fields.is_empty() {
            vec![self.fields.primary().to_string()]
        } else {
            self.key_fields.clone()
        }
    }

    pub fn strategy(&self) -> Strategy {
        Strategy::from_container(self.container.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.package.trim().is_empty() {
            return Err(ConfigError::EmptyPackage);
        }
        if let Some(unknown) = self.key_fields.iter().find(|k| !self.fields.contains(k)) {
            return Err(ConfigError::UnknownKeyField(unknown.clone()));
        }
        if self.target == 0 {
            return Err(ConfigError::Zero("target"));
        }
        if self.max_empty_rounds == 0 {
            return Err(ConfigError::Zero("max_empty_rounds"));
        }
        for (name, value) in [
            ("start_ratio", self.scroll.start_ratio),
            ("end_ratio", self.scroll.end_ratio),
        ] {
            check_ratio(name, value)?;
        }
        if let Some(long) = &self.scroll.long_swipe {
            if long.every == 0 {
                return Err(ConfigError::Zero("long_swipe.every"));
            }
            check_ratio("long_swipe.start_ratio", long.start_ratio)?;
            check_ratio("long_swipe.end_ratio", long.end_ratio)?;
        }
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::BadRatio { name, value })
    }
}

/// Convert a seconds value from a config file into a `Duration`.
pub fn seconds(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(Duration::from_secs_f64(value))
    } else {
        Err(ConfigError::BadSeconds { name, value })
    }
}
