use std::cell::RefCell;
use std::time::Duration;

use crate::device::{Device, DeviceInfo, Frame};
use crate::error::DeviceError;

/// A test double that serves a scripted sequence of frames and records every
/// input call. Used throughout the other crates' test suites in place of a
/// real ADB-backed device.
pub struct MockDevice {
    info: DeviceInfo,
    frames: RefCell<Vec<Frame>>,
    frame_cursor: RefCell<usize>,
    pub clicks: RefCell<Vec<(f64, f64)>>,
    pub shells: RefCell<Vec<String>>,
}

impl MockDevice {
    pub fn new(info: DeviceInfo, frames: Vec<Frame>) -> Self {
        MockDevice {
            info,
            frames: RefCell::new(frames),
            frame_cursor: RefCell::new(0),
            clicks: RefCell::new(Vec::new()),
            shells: RefCell::new(Vec::new()),
        }
    }

    /// Appends a frame to be served after all currently queued frames are
    /// exhausted (the last frame repeats once the queue runs dry).
    pub fn push_frame(&self, frame: Frame) {
        self.frames.borrow_mut().push(frame);
    }

    pub fn click_count(&self) -> usize {
        self.clicks.borrow().len()
    }
}

impl Device for MockDevice {
    fn serial(&self) -> &str {
        "mock-0"
    }

    fn info(&self) -> DeviceInfo {
        self.info
    }

    fn screenshot(&self, _timeout: Duration) -> Result<Frame, DeviceError> {
        let frames = self.frames.borrow();
        if frames.is_empty() {
            return Err(DeviceError::Timeout {
                serial: self.serial().to_string(),
                timeout_s: _timeout.as_secs_f64(),
            });
        }
        let mut cursor = self.frame_cursor.borrow_mut();
        let idx = (*cursor).min(frames.len() - 1);
        if *cursor < frames.len() - 1 {
            *cursor += 1;
        }
        Ok(frames[idx].clone())
    }

    fn click(&self, x: f64, y: f64) -> Result<(), DeviceError> {
        self.clicks.borrow_mut().push((x, y));
        Ok(())
    }

    fn swipe(&self, _x1: f64, _y1: f64, _x2: f64, _y2: f64, _duration: Duration) -> Result<(), DeviceError> {
        Ok(())
    }

    fn long_tap(&self, x: f64, y: f64, _duration: Duration) -> Result<(), DeviceError> {
        self.clicks.borrow_mut().push((x, y));
        Ok(())
    }

    fn key_event(&self, _code: u32) -> Result<(), DeviceError> {
        Ok(())
    }

    fn text(&self, _content: &str) -> Result<(), DeviceError> {
        Ok(())
    }

    fn shell(&self, cmd: &str) -> Result<String, DeviceError> {
        self.shells.borrow_mut().push(cmd.to_string());
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, fill: u8) -> Frame {
        Frame {
            width,
            height,
            rgb: vec![fill; (width * height * 3) as usize],
        }
    }

    #[test]
    fn serves_frames_in_order_then_repeats_last() {
        let device = MockDevice::new(
            DeviceInfo { width: 2, height: 2 },
            vec![frame(2, 2, 1), frame(2, 2, 2)],
        );
        assert_eq!(device.screenshot(Duration::from_secs(1)).unwrap().rgb[0], 1);
        assert_eq!(device.screenshot(Duration::from_secs(1)).unwrap().rgb[0], 2);
        assert_eq!(device.screenshot(Duration::from_secs(1)).unwrap().rgb[0], 2);
    }

    #[test]
    fn records_clicks() {
        let device = MockDevice::new(DeviceInfo { width: 2, height: 2 }, vec![frame(2, 2, 0)]);
        device.click(0.1, 0.2).unwrap();
        device.click(0.3, 0.4).unwrap();
        assert_eq!(device.click_count(), 2);
        assert_eq!(device.clicks.borrow()[1], (0.3, 0.4));
    }
}
