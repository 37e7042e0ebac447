use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use sortie_device::Device;
use sortie_plan::CombatPhase;
use sortie_vision::{ImageChecker, ImageSignature, Screen};

use crate::error::CombatRecognitionTimeout;

/// How often `wait_for_phase` re-screenshots and rechecks candidates. Kept
/// distinct from `sortie_pages::DEFAULT_INTERVAL` — page navigation and
/// combat-phase recognition are different polling loops with different
/// natural cadences.
pub const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// What identifies one recognizable combat phase, and how long to wait for
/// it before giving up.
#[derive(Debug, Clone)]
pub struct PhaseSignature {
    pub phase: CombatPhase,
    pub signature: ImageSignature,
    pub default_timeout_s: f64,
    pub post_match_delay_s: f64,
}

impl PhaseSignature {
    pub fn new(phase: CombatPhase, signature: ImageSignature, default_timeout_s: f64) -> Self {
        PhaseSignature {
            phase,
            signature,
            default_timeout_s,
            post_match_delay_s: 0.0,
        }
    }

    pub fn with_post_match_delay(mut self, delay_s: f64) -> Self {
        self.post_match_delay_s = delay_s;
        self
    }
}

/// Holds the phase→signature table and drives phase-waiting polling loops.
#[derive(Debug, Clone, Default)]
pub struct CombatRecognizer {
    signatures: HashMap<CombatPhase, PhaseSignature>,
}

impl CombatRecognizer {
    pub fn new() -> Self {
        CombatRecognizer::default()
    }

    pub fn register(&mut self, sig: PhaseSignature) {
        self.signatures.insert(sig.phase, sig);
    }

    /// Single-shot, non-blocking check against one screenshot. Used both by
    /// `wait_for_phase`'s inner loop and by recovery logic that needs to
    /// classify the current screen without waiting.
    pub fn identify_current(&self, screen: &Screen, candidates: &[CombatPhase]) -> Option<CombatPhase> {
        for phase in candidates {
            let Some(sig) = self.signatures.get(phase) else {
                continue;
            };
            if ImageChecker::check_signature(screen, &sig.signature) {
                trace!(?phase, "phase signature matched");
                return Some(*phase);
            }
        }
        None
    }

    /// Polls the device until one of `candidates` is recognized, calling
    /// `poll_action` (if given) once per iteration before rechecking — the
    /// hook used for dismissing overlays or nudging UI state while waiting.
    /// The overall deadline is the max timeout among the candidates.
    pub fn wait_for_phase(
        &self,
        device: &dyn Device,
        candidates: &[CombatPhase],
        mut poll_action: Option<&mut dyn FnMut(&dyn Device)>,
    ) -> Result<CombatPhase, CombatRecognitionTimeout> {
        let timeout_s = candidates
            .iter()
            .filter_map(|p| self.signatures.get(p).map(|s| s.default_timeout_s))
            .fold(0.0_f64, f64::max);
        let deadline = Instant::now() + Duration::from_secs_f64(timeout_s.max(0.001));

        loop {
            let frame = match device.screenshot(Duration::from_secs(5)) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(?err, "screenshot failed while waiting for phase");
                    std::thread::sleep(POLL_INTERVAL);
                    if Instant::now() >= deadline {
                        return Err(CombatRecognitionTimeout {
                            candidates: candidates.to_vec(),
                            elapsed_s: timeout_s,
                        });
                    }
                    continue;
                }
            };
            let screen = sortie_pages::frame_to_screen(&frame);

            if let Some(phase) = self.identify_current(&screen, candidates) {
                if let Some(sig) = self.signatures.get(&phase) {
                    if sig.post_match_delay_s > 0.0 {
                        std::thread::sleep(Duration::from_secs_f64(sig.post_match_delay_s));
                    }
                }
                debug!(?phase, "phase recognized");
                return Ok(phase);
            }

            if Instant::now() >= deadline {
                return Err(CombatRecognitionTimeout {
                    candidates: candidates.to_vec(),
                    elapsed_s: timeout_s,
                });
            }

            if let Some(action) = poll_action.as_deref_mut() {
                action(device);
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortie_vision::MatchStrategy;

    fn flat_screen(width: u32, height: u32, rgb: (u8, u8, u8)) -> Screen {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Screen::new(width, height, data)
    }

    fn empty_signature(phase: CombatPhase) -> PhaseSignature {
        // An ALL-strategy signature with zero rules trivially matches, which
        // is enough to exercise the recognizer's dispatch logic without
        // needing a real template image.
        PhaseSignature::new(
            phase,
            ImageSignature {
                name: format!("{phase:?}"),
                rules: vec![],
                strategy: MatchStrategy::All,
                threshold: 0,
            },
            1.0,
        )
    }

    #[test]
    fn identify_current_returns_none_for_unregistered_candidate() {
        let recognizer = CombatRecognizer::new();
        let screen = flat_screen(4, 4, (10, 10, 10));
        assert_eq!(recognizer.identify_current(&screen, &[CombatPhase::Proceed]), None);
    }

    #[test]
    fn identify_current_matches_registered_trivial_signature() {
        let mut recognizer = CombatRecognizer::new();
        recognizer.register(empty_signature(CombatPhase::Proceed));
        let screen = flat_screen(4, 4, (10, 10, 10));
        assert_eq!(
            recognizer.identify_current(&screen, &[CombatPhase::Proceed]),
            Some(CombatPhase::Proceed)
        );
    }

    #[test]
    fn register_overwrites_existing_phase_entry() {
        let mut recognizer = CombatRecognizer::new();
        recognizer.register(empty_signature(CombatPhase::Proceed).with_post_match_delay(2.0));
        recognizer.register(empty_signature(CombatPhase::Proceed).with_post_match_delay(5.0));
        assert_eq!(
            recognizer.signatures.get(&CombatPhase::Proceed).unwrap().post_match_delay_s,
            5.0
        );
    }
}
