use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::error::DeviceError;

/// Opaque selector naming a class of UI elements, e.g. an Android resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Locator(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Locator(value.to_string())
    }
}

/// Read access to the current view tree, plus the swipe gesture used to page it.
///
/// Element handles are cheap values owned by the caller; every query goes
/// back through the accessor, which may hold the connection.
pub trait ViewAccessor {
    type Element: Clone + fmt::Debug;

    /// All elements matching `locator`, in screen order.
    fn find(&mut self, locator: &Locator) -> Result<Vec<Self::Element>, DeviceError>;

    fn exists(&mut self, element: &Self::Element) -> Result<bool, DeviceError>;

    /// Text content; empty when the element carries none.
    fn text(&mut self, element: &Self::Element) -> Result<String, DeviceError>;

    /// First descendant of `parent` matching `locator`.
    fn find_child(
        &mut self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Option<Self::Element>, DeviceError>;

    /// Screen size in pixels as `(width, height)`.
    fn screen_size(&mut self) -> Result<(u32, u32), DeviceError>;

    fn swipe(
        &mut self,
        from: (u32, u32),
        to: (u32, u32),
        duration: Duration,
    ) -> Result<(), DeviceError>;
}

/// App lifecycle operations on a connected device.
pub trait AppLifecycle {
    fn device_name(&mut self) -> Result<String, DeviceError>;

    fn start_app(&mut self, package: &str) -> Result<(), DeviceError>;

    /// Package currently in the foreground, if any.
    fn current_app(&mut self) -> Result<Option<String>, DeviceError>;
}

/// A connected device: view access plus app lifecycle.
pub trait Device: ViewAccessor + AppLifecycle {}

impl<T: ViewAccessor + AppLifecycle> Device for T {}

/// Produces a connected device at the start of a run.
pub trait Connector {
    type Device: Device;

    fn connect(&mut self) -> Result<Self::Device, DeviceError>;
}

impl<D, F> Connector for F
where
    D: Device,
    F: FnMut() -> Result<D, DeviceError>,
{
    type Device = D;

    fn connect(&mut self) -> Result<D, DeviceError> {
        self()
    }
}
