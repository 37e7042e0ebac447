use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::color::Color;
use crate::screen::Screen;

/// How a [`PixelSignature`]'s rules combine into a single match decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// every rule must match
    All,
    /// at least one rule must match
    Any,
    /// at least `threshold` rules must match
    Count,
}

/// A single sampled-point color assertion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRule {
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub tolerance: f64,
}

impl PixelRule {
    pub fn new(x: f64, y: f64, color: Color, tolerance: f64) -> Self {
        PixelRule {
            x,
            y,
            color,
            tolerance,
        }
    }

    pub fn of(x: f64, y: f64, color: Color) -> Self {
        PixelRule::new(x, y, color, 30.0)
    }

    pub fn matches(&self, screen: &Screen) -> bool {
        let actual = screen.get_pixel(self.x, self.y);
        actual.near(&self.color, self.tolerance)
    }
}

/// A named, ordered set of pixel rules identifying a single page or state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelSignature {
    pub name: String,
    pub rules: Vec<PixelRule>,
    pub strategy: MatchStrategy,
    pub threshold: usize,
}

impl PixelSignature {
    pub fn new(name: impl Into<String>, rules: Vec<PixelRule>, strategy: MatchStrategy) -> Self {
        PixelSignature {
            name: name.into(),
            rules,
            strategy,
            threshold: 0,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        assert!(
            self.strategy != MatchStrategy::Count || threshold <= self.rules.len(),
            "COUNT threshold must not exceed rule count"
        );
        self.threshold = threshold;
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixelDetail {
    pub rule: PixelRule,
    pub actual: Color,
    pub distance: f64,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelMatchResult {
    pub matched: bool,
    pub signature_name: String,
    pub matched_count: usize,
    pub total_count: usize,
    pub details: Vec<PixelDetail>,
}

impl PixelMatchResult {
    pub fn ratio(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.matched_count as f64 / self.total_count as f64
        }
    }
}

/// Pure, static evaluators over a screenshot and pixel signatures.
pub struct PixelChecker;

impl PixelChecker {
    pub fn get_pixel(screen: &Screen, x: f64, y: f64) -> Color {
        screen.get_pixel(x, y)
    }

    pub fn check_pixel(screen: &Screen, rule: &PixelRule) -> bool {
        rule.matches(screen)
    }

    pub fn check_signature(
        screen: &Screen,
        sig: &PixelSignature,
        with_details: bool,
    ) -> PixelMatchResult {
        let mut matched_count = 0usize;
        let mut details = Vec::new();

        for rule in &sig.rules {
            let actual = screen.get_pixel(rule.x, rule.y);
            let distance = actual.distance(&rule.color);
            let matched = distance <= rule.tolerance;
            if matched {
                matched_count += 1;
            }
            if with_details {
                details.push(PixelDetail {
                    rule: *rule,
                    actual,
                    distance,
                    matched,
                });
            }

            match sig.strategy {
                MatchStrategy::All if !matched => {
                    return PixelMatchResult {
                        matched: false,
                        signature_name: sig.name.clone(),
                        matched_count,
                        total_count: sig.rules.len(),
                        details,
                    };
                }
                MatchStrategy::Any if matched => {
                    if !with_details {
                        return PixelMatchResult {
                            matched: true,
                            signature_name: sig.name.clone(),
                            matched_count,
                            total_count: sig.rules.len(),
                            details,
                        };
                    }
                }
                _ => {}
            }
        }

        let matched = match sig.strategy {
            MatchStrategy::All => true,
            MatchStrategy::Any => matched_count > 0,
            MatchStrategy::Count => matched_count >= sig.threshold,
        };

        PixelMatchResult {
            matched,
            signature_name: sig.name.clone(),
            matched_count,
            total_count: sig.rules.len(),
            details,
        }
    }

    /// First signature that matches, in list order.
    pub fn identify<'a>(
        screen: &Screen,
        signatures: &'a [PixelSignature],
    ) -> Option<(&'a PixelSignature, PixelMatchResult)> {
        for sig in signatures {
            let result = Self::check_signature(screen, sig, false);
            if result.matched {
                return Some((sig, result));
            }
        }
        None
    }

    /// All matching signatures, no short-circuit across the signature list.
    pub fn identify_all<'a>(
        screen: &Screen,
        signatures: &'a [PixelSignature],
    ) -> Vec<(&'a PixelSignature, PixelMatchResult)> {
        signatures
            .iter()
            .filter_map(|sig| {
                let result = Self::check_signature(screen, sig, false);
                result.matched.then_some((sig, result))
            })
            .collect()
    }

    /// Nearest named color within tolerance, or None.
    pub fn classify_color<'a>(
        screen: &Screen,
        x: f64,
        y: f64,
        palette: &'a HashMap<String, Color>,
        tolerance: f64,
    ) -> Option<&'a str> {
        let actual = screen.get_pixel(x, y);
        palette
            .iter()
            .map(|(name, color)| (name.as_str(), actual.distance(color)))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(name, _)| name)
    }

    pub fn crop(screen: &Screen, x1: f64, y1: f64, x2: f64, y2: f64) -> Screen {
        screen.crop_relative(x1, y1, x2, y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: (u8, u8, u8)) -> Screen {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width * height) {
            data.push(color.0);
            data.push(color.1);
            data.push(color.2);
        }
        Screen::new(width, height, data)
    }

    #[test]
    fn all_short_circuits_on_first_failure() {
        let screen = solid(10, 10, (0, 0, 0));
        let rules = vec![
            PixelRule::of(0.1, 0.1, Color::new(255, 255, 255)),
            PixelRule::of(0.2, 0.2, Color::new(0, 0, 0)),
        ];
        let sig = PixelSignature::new("s", rules, MatchStrategy::All);
        let result = PixelChecker::check_signature(&screen, &sig, true);
        assert!(!result.matched);
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.details.len(), 1, "must not evaluate past first failure");
    }

    #[test]
    fn any_matches_on_first_success() {
        let screen = solid(10, 10, (0, 0, 0));
        let rules = vec![
            PixelRule::of(0.1, 0.1, Color::new(0, 0, 0)),
            PixelRule::of(0.2, 0.2, Color::new(255, 255, 255)),
        ];
        let sig = PixelSignature::new("s", rules, MatchStrategy::Any);
        let result = PixelChecker::check_signature(&screen, &sig, false);
        assert!(result.matched);
    }

    #[test]
    fn count_requires_threshold_and_does_not_short_circuit() {
        let screen = solid(10, 10, (0, 0, 0));
        let rules = vec![
            PixelRule::of(0.1, 0.1, Color::new(0, 0, 0)),
            PixelRule::of(0.2, 0.2, Color::new(0, 0, 0)),
            PixelRule::of(0.3, 0.3, Color::new(255, 255, 255)),
        ];
        let sig = PixelSignature::new("s", rules, MatchStrategy::Count).with_threshold(2);
        let result = PixelChecker::check_signature(&screen, &sig, true);
        assert!(result.matched);
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.details.len(), 3, "COUNT evaluates every rule");
    }

    #[test]
    fn identify_returns_first_match() {
        let screen = solid(10, 10, (0, 0, 0));
        let a = PixelSignature::new(
            "a",
            vec![PixelRule::of(0.1, 0.1, Color::new(0, 0, 0))],
            MatchStrategy::All,
        );
        let b = PixelSignature::new(
            "b",
            vec![PixelRule::of(0.1, 0.1, Color::new(0, 0, 0))],
            MatchStrategy::All,
        );
        let (sig, _) = PixelChecker::identify(&screen, &[a, b]).unwrap();
        assert_eq!(sig.name, "a");
    }

    #[test]
    fn classify_color_picks_nearest_within_tolerance() {
        let screen = solid(10, 10, (10, 10, 10));
        let mut palette = HashMap::new();
        palette.insert("dark".to_string(), Color::new(0, 0, 0));
        palette.insert("light".to_string(), Color::new(200, 200, 200));
        assert_eq!(
            PixelChecker::classify_color(&screen, 0.5, 0.5, &palette, 30.0),
            Some("dark")
        );
        assert_eq!(
            PixelChecker::classify_color(&screen, 0.5, 0.5, &palette, 5.0),
            None
        );
    }
}
