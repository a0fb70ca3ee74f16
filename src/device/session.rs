use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::accessor::{AppLifecycle, Connector, Locator, ViewAccessor};
use crate::device::error::DeviceError;

/// Request sent to the device bridge over stdin (one JSON line).
///
/// Every response is one JSON line with `ok` and, on failure, `error`
/// (plus `stale: true` when the element handle no longer resolves). The
/// first line the bridge prints on startup is `{"ok":true,"ready":true}`.
/// Fields expected on success, per command:
///
/// | `cmd`         | request fields                  | response fields      |
/// |---------------|---------------------------------|----------------------|
/// | `device_info` |                                 | `name`               |
/// | `app_start`   | `package`                       |                      |
/// | `app_current` |                                 | `package`            |
/// | `find`        | `locator`                       | `elements` (handles) |
/// | `exists`      | `element`                       | `exists`             |
/// | `text`        | `element`                       | `text`               |
/// | `child`       | `element`, `locator`            | `element` or absent  |
/// | `window_size` |                                 | `width`, `height`    |
/// | `swipe`       | `from`, `to` (`[x, y]`), `duration_ms` |               |
/// | `quit`        |                                 |                      |
///
/// Element handles are opaque strings chosen by the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeRequest {
    DeviceInfo,
    AppStart { package: String },
    AppCurrent,
    Find { locator: String },
    Exists { element: String },
    Text { element: String },
    Child { element: String, locator: String },
    WindowSize,
    Swipe {
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u64,
    },
    Quit,
}

impl BridgeRequest {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeRequest::DeviceInfo => "device_info",
            BridgeRequest::AppStart { .. } => "app_start",
            BridgeRequest::AppCurrent => "app_current",
            BridgeRequest::Find { .. } => "find",
            BridgeRequest::Exists { .. } => "exists",
            BridgeRequest::Text { .. } => "text",
            BridgeRequest::Child { .. } => "child",
            BridgeRequest::WindowSize => "window_size",
            BridgeRequest::Swipe { .. } => "swipe",
            BridgeRequest::Quit => "quit",
        }
    }
}

/// Response received from the device bridge over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BridgeResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub stale: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub elements: Option<Vec<String>>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub exists: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Handle to an element held by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

/// A live device session backed by a bridge process.
///
/// The bridge (by default a uiautomator2 script) keeps the device connection
/// open. Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct DeviceSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl DeviceSession {
    /// Spawn the bridge and wait for its ready line.
    pub fn launch(command: &[String]) -> Result<Self, DeviceError> {
        let (program, args) = command.split_first().ok_or_else(|| DeviceError::Spawn {
            command: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty bridge command"),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        // Own process group: Ctrl-C on the terminal must not kill the bridge
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| DeviceError::Spawn {
                command: command.join(" "),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DeviceError::Io("failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DeviceError::Io("failed to capture bridge stdout".into()))?;

        let mut session = DeviceSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let ready = session.read_response("ready signal")?;
        if !ready.ok || ready.ready != Some(true) {
            return Err(DeviceError::Command {
                command: "launch".into(),
                error: ready
                    .error
                    .unwrap_or_else(|| "bridge did not report ready".into()),
            });
        }

        Ok(session)
    }

    fn read_response(&mut self, context: &str) -> Result<BridgeResponse, DeviceError> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| DeviceError::Io(format!("failed to read {}: {}", context, e)))?;

        if line.trim().is_empty() {
            return Err(DeviceError::Io(format!(
                "empty {} from bridge (process may have died)",
                context
            )));
        }

        debug!(response = line.trim(), "bridge <-");
        serde_json::from_str(line.trim()).map_err(|e| DeviceError::Json {
            context: context.to_string(),
            source: e,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BridgeRequest) -> Result<BridgeResponse, DeviceError> {
        if self.closed {
            return Err(DeviceError::NotConnected);
        }

        let json = serde_json::to_string(request).map_err(|e| DeviceError::Json {
            context: "BridgeRequest".into(),
            source: e,
        })?;
        debug!(request = %json, "bridge ->");

        writeln!(self.stdin, "{}", json)
            .map_err(|e| DeviceError::Io(format!("failed to write to bridge: {}", e)))?;
        self.stdin
            .flush()
            .map_err(|e| DeviceError::Io(format!("failed to flush bridge stdin: {}", e)))?;

        self.read_response("bridge response")
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BridgeRequest) -> Result<BridgeResponse, DeviceError> {
        let response = self.send(request)?;
        if response.ok {
            return Ok(response);
        }
        if response.stale == Some(true) {
            return Err(DeviceError::StaleElement(
                response.error.unwrap_or_default(),
            ));
        }
        Err(DeviceError::Command {
            command: request.name().into(),
            error: response.error.unwrap_or_else(|| "unknown error".into()),
        })
    }

    fn missing(request: &BridgeRequest, field: &str) -> DeviceError {
        DeviceError::Command {
            command: request.name().into(),
            error: format!("no '{}' in response", field),
        }
    }

    /// Ask the bridge to exit and reap it.
    pub fn quit(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            return Ok(());
        }
        // Best-effort: the process may already be gone
        let _ = self.send(&BridgeRequest::Quit);
        self.closed = true;
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

impl ViewAccessor for DeviceSession {
    type Element = ElementId;

    fn find(&mut self, locator: &Locator) -> Result<Vec<ElementId>, DeviceError> {
        let request = BridgeRequest::Find {
            locator: locator.as_str().to_string(),
        };
        let response = self.send_ok(&request)?;
        Ok(response
            .elements
            .unwrap_or_default()
            .into_iter()
            .map(ElementId)
            .collect())
    }

    fn exists(&mut self, element: &ElementId) -> Result<bool, DeviceError> {
        let request = BridgeRequest::Exists {
            element: element.0.clone(),
        };
        let response = self.send_ok(&request)?;
        Ok(response.exists.unwrap_or(false))
    }

    fn text(&mut self, element: &ElementId) -> Result<String, DeviceError> {
        let request = BridgeRequest::Text {
            element: element.0.clone(),
        };
        let response = self.send_ok(&request)?;
        Ok(response.text.unwrap_or_default())
    }

    fn find_child(
        &mut self,
        parent: &ElementId,
        locator: &Locator,
    ) -> Result<Option<ElementId>, DeviceError> {
        let request = BridgeRequest::Child {
            element: parent.0.clone(),
            locator: locator.as_str().to_string(),
        };
        let response = self.send_ok(&request)?;
        Ok(response.element.map(ElementId))
    }

    fn screen_size(&mut self) -> Result<(u32, u32), DeviceError> {
        let request = BridgeRequest::WindowSize;
        let response = self.send_ok(&request)?;
        match (response.width, response.height) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(Self::missing(&request, "width/height")),
        }
    }

    fn swipe(
        &mut self,
        from: (u32, u32),
        to: (u32, u32),
        duration: Duration,
    ) -> Result<(), DeviceError> {
        let request = BridgeRequest::Swipe {
            from,
            to,
            duration_ms: duration.as_millis() as u64,
        };
        self.send_ok(&request)?;
        Ok(())
    }
}

impl AppLifecycle for DeviceSession {
    fn device_name(&mut self) -> Result<String, DeviceError> {
        let response = self.send_ok(&BridgeRequest::DeviceInfo)?;
        Ok(response.name.unwrap_or_else(|| "unknown device".into()))
    }

    fn start_app(&mut self, package: &str) -> Result<(), DeviceError> {
        self.send_ok(&BridgeRequest::AppStart {
            package: package.to_string(),
        })?;
        Ok(())
    }

    fn current_app(&mut self) -> Result<Option<String>, DeviceError> {
        let response = self.send_ok(&BridgeRequest::AppCurrent)?;
        Ok(response.package)
    }
}

/// Connects by launching a bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConnector {
    pub command: Vec<String>,
}

impl BridgeConnector {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Connector for BridgeConnector {
    type Device = DeviceSession;

    fn connect(&mut self) -> Result<DeviceSession, DeviceError> {
        DeviceSession::launch(&self.command)
    }
}
