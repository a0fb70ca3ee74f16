use thiserror::Error;

/// Errors raised while talking to the device or its bridge process.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Bridge process failed to spawn
    #[error("failed to spawn bridge '{command}' (is it installed?): {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// Reading from or writing to the bridge failed
    #[error("bridge I/O error: {0}")]
    Io(String),

    /// Bridge output could not be parsed
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// Bridge answered a command with `ok: false`
    #[error("bridge command '{command}' failed: {error}")]
    Command { command: String, error: String },

    /// Element handle no longer refers to anything on screen
    #[error("element '{0}' is stale")]
    StaleElement(String),

    /// Session was closed or never established
    #[error("device not connected")]
    NotConnected,

    /// App started but another package holds the foreground
    #[error("expected '{expected}' in foreground, found '{actual}'")]
    NotForeground { expected: String, actual: String },
}

impl DeviceError {
    /// Whether the error leaves the device unusable for the rest of the run.
    ///
    /// Command failures and stale handles concern a single element or call;
    /// everything else means the bridge itself is gone or out of sync.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DeviceError::Command { .. } | DeviceError::StaleElement(_)
        )
    }
}
