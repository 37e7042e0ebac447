use std::time::{Duration, Instant};

use sortie_device::{Device, Frame};
use sortie_vision::Screen;
use tracing::{debug, trace};

use crate::error::NavigationError;
use crate::overlay::{detect_overlay, Overlay};

/// Polling interval for page-navigation waits. Distinct from, and
/// deliberately not unified with, the combat recognizer's 0.3s interval —
/// see `sortie-engine`'s `POLL_INTERVAL` and `SPEC_FULL.md` section 9 for
/// why both literal values are kept.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

pub fn frame_to_screen(frame: &Frame) -> Screen {
    Screen::new(frame.width, frame.height, frame.rgb.clone())
}

fn take_screenshot(device: &dyn Device, timeout: Duration) -> Result<Screen, ()> {
    device.screenshot(timeout).map(|f| frame_to_screen(&f)).map_err(|_| ())
}

/// Waits until `is_target` matches the current screen, optionally dismissing
/// known overlays (signin > news > retry) once per iteration while waiting.
pub fn wait_for_page(
    device: &dyn Device,
    is_target: &dyn Fn(&Screen) -> bool,
    timeout: Duration,
    interval: Duration,
    overlays: &[Overlay],
    source: &str,
    target: &str,
) -> Result<Screen, NavigationError> {
    let deadline = Instant::now() + timeout;
    let mut last_seen: Option<String> = None;

    loop {
        let screen = match take_screenshot(device, timeout) {
            Ok(s) => s,
            Err(_) => {
                std::thread::sleep(interval);
                if Instant::now() >= deadline {
                    return Err(NavigationError::Timeout {
                        source: source.to_string(),
                        target: target.to_string(),
                        timeout_s: timeout.as_secs_f64(),
                        last_seen,
                    });
                }
                continue;
            }
        };

        if is_target(&screen) {
            return Ok(screen);
        }

        if let Some(overlay) = detect_overlay(&screen, overlays) {
            debug!(kind = ?overlay.kind, "dismissing overlay while waiting for page");
            let _ = device.click(overlay.dismiss_at.0, overlay.dismiss_at.1);
            last_seen = Some(format!("{:?}", overlay.kind));
        } else {
            trace!("page not yet matched, still waiting");
        }

        if Instant::now() >= deadline {
            return Err(NavigationError::Timeout {
                source: source.to_string(),
                target: target.to_string(),
                timeout_s: timeout.as_secs_f64(),
                last_seen,
            });
        }
        std::thread::sleep(interval);
    }
}

/// Waits until `is_current` no longer matches — used when the destination
/// page has no signature of its own yet.
pub fn wait_leave_page(
    device: &dyn Device,
    is_current: &dyn Fn(&Screen) -> bool,
    timeout: Duration,
    interval: Duration,
    source: &str,
) -> Result<Screen, NavigationError> {
    let deadline = Instant::now() + timeout;
    loop {
        let screen = match take_screenshot(device, timeout) {
            Ok(s) => s,
            Err(_) => {
                if Instant::now() >= deadline {
                    return Err(NavigationError::Timeout {
                        source: source.to_string(),
                        target: "<left current page>".to_string(),
                        timeout_s: timeout.as_secs_f64(),
                        last_seen: None,
                    });
                }
                std::thread::sleep(interval);
                continue;
            }
        };
        if !is_current(&screen) {
            return Ok(screen);
        }
        if Instant::now() >= deadline {
            return Err(NavigationError::Timeout {
                source: source.to_string(),
                target: "<left current page>".to_string(),
                timeout_s: timeout.as_secs_f64(),
                last_seen: Some(source.to_string()),
            });
        }
        std::thread::sleep(interval);
    }
}

/// A click followed by `wait_for_page`, retried once after a short backoff
/// on timeout to tolerate a dropped tap.
pub fn click_and_wait(
    device: &dyn Device,
    click_at: (f64, f64),
    is_target: &dyn Fn(&Screen) -> bool,
    timeout: Duration,
    interval: Duration,
    overlays: &[Overlay],
    source: &str,
    target: &str,
    retries: u32,
) -> Result<Screen, NavigationError> {
    let mut attempt = 0;
    loop {
        let _ = device.click(click_at.0, click_at.1);
        match wait_for_page(device, is_target, timeout, interval, overlays, source, target) {
            Ok(screen) => return Ok(screen),
            Err(err) => {
                if attempt >= retries {
                    return Err(err);
                }
                attempt += 1;
                std::thread::sleep(Duration::from_millis(250));
            }
        }
    }
}

/// Two-step submenu navigation: click the nav item, wait `submenu_delay` for
/// its popup to open, click the submenu entry, then `wait_for_page` as usual.
/// A single click on a submenu nav item only opens the popup; this is what
/// `sidebar -> build`/`sidebar -> intensify` need instead of `click_and_wait`.
#[allow(clippy::too_many_arguments)]
pub fn click_and_wait_submenu(
    device: &dyn Device,
    click_at: (f64, f64),
    submenu_click_at: (f64, f64),
    submenu_delay: Duration,
    is_target: &dyn Fn(&Screen) -> bool,
    timeout: Duration,
    interval: Duration,
    overlays: &[Overlay],
    source: &str,
    target: &str,
    retries: u32,
) -> Result<Screen, NavigationError> {
    let mut attempt = 0;
    loop {
        let _ = device.click(click_at.0, click_at.1);
        std::thread::sleep(submenu_delay);
        let _ = device.click(submenu_click_at.0, submenu_click_at.1);
        match wait_for_page(device, is_target, timeout, interval, overlays, source, target) {
            Ok(screen) => return Ok(screen),
            Err(err) => {
                if attempt >= retries {
                    return Err(err);
                }
                attempt += 1;
                std::thread::sleep(Duration::from_millis(250));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortie_device::{DeviceInfo, MockDevice};

    fn frame(fill: u8) -> Frame {
        Frame {
            width: 4,
            height: 4,
            rgb: vec![fill; 4 * 4 * 3],
        }
    }

    #[test]
    fn wait_for_page_returns_once_target_matches() {
        let device = MockDevice::new(
            DeviceInfo { width: 4, height: 4 },
            vec![frame(0), frame(0), frame(200)],
        );
        let is_target = |s: &Screen| s.get_pixel(0.5, 0.5).r > 100;
        let result = wait_for_page(
            &device,
            &is_target,
            Duration::from_secs(1),
            Duration::from_millis(1),
            &[],
            "a",
            "b",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn click_and_wait_clicks_before_each_attempt() {
        let device = MockDevice::new(DeviceInfo { width: 4, height: 4 }, vec![frame(0)]);
        let is_target = |s: &Screen| s.get_pixel(0.5, 0.5).r > 100;
        let _ = click_and_wait(
            &device,
            (0.5, 0.5),
            &is_target,
            Duration::from_millis(5),
            Duration::from_millis(1),
            &[],
            "a",
            "b",
            1,
        );
        assert_eq!(device.click_count(), 2, "initial attempt + one retry");
    }

    #[test]
    fn click_and_wait_submenu_clicks_nav_then_submenu() {
        let device = MockDevice::new(DeviceInfo { width: 4, height: 4 }, vec![frame(200)]);
        let is_target = |s: &Screen| s.get_pixel(0.5, 0.5).r > 100;
        let result = click_and_wait_submenu(
            &device,
            (0.15, 0.37),
            (0.37, 0.37),
            Duration::from_millis(1),
            &is_target,
            Duration::from_millis(50),
            Duration::from_millis(1),
            &[],
            "sidebar",
            "build",
            0,
        );
        assert!(result.is_ok());
        assert_eq!(device.click_count(), 2, "nav click then submenu click");
    }
}
