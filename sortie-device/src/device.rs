use std::time::Duration;

use crate::error::DeviceError;

/// Resolution reported once at connect time; never consulted by core logic
/// beyond logging — all coordinates the core sends/receives are relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub width: u32,
    pub height: u32,
}

/// A captured RGB framebuffer, row-major top-to-bottom.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// The device contract consumed by the combat core. All coordinate
/// arguments are relative: x, y in [0, 1]. No implementation of the ADB
/// transport itself is provided by this crate — callers supply their own.
pub trait Device {
    fn serial(&self) -> &str;

    fn info(&self) -> DeviceInfo;

    /// Blocks until a frame is available or `timeout` elapses.
    fn screenshot(&self, timeout: Duration) -> Result<Frame, DeviceError>;

    fn click(&self, x: f64, y: f64) -> Result<(), DeviceError>;

    fn swipe(&self, x1: f64, y1: f64, x2: f64, y2: f64, duration: Duration) -> Result<(), DeviceError>;

    fn long_tap(&self, x: f64, y: f64, duration: Duration) -> Result<(), DeviceError>;

    fn key_event(&self, code: u32) -> Result<(), DeviceError>;

    fn text(&self, content: &str) -> Result<(), DeviceError>;

    fn shell(&self, cmd: &str) -> Result<String, DeviceError>;
}
