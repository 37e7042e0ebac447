use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::roi::Roi;
use crate::screen::Screen;

/// Normalized cross-correlation method. `CcoeffNormed` is the default and the
/// only method used for [`ImageChecker::find_all_occurrences`]; the `SqDiff`
/// variants exist for parity with templates authored against the original
/// matcher and are inverted so higher always means better, following the
/// same (intentionally asymmetric) rule the original matcher applies:
/// `SqDiffNormed` maps to `1.0 - min`, plain `SqDiff` is kept as `min`
/// unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationMethod {
    CcoeffNormed,
    SqDiff,
    SqDiffNormed,
}

impl Default for CorrelationMethod {
    fn default() -> Self {
        CorrelationMethod::CcoeffNormed
    }
}

/// A reference image captured at a known resolution, matched against a
/// screenshot potentially taken at a different resolution.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    gray: Vec<u8>,
    width: u32,
    height: u32,
    pub source_resolution: (u32, u32),
}

impl Template {
    pub fn from_rgb(
        name: impl Into<String>,
        width: u32,
        height: u32,
        rgb: &[u8],
        source_resolution: (u32, u32),
    ) -> Self {
        assert_eq!(rgb.len(), width as usize * height as usize * 3);
        let gray = rgb
            .chunks_exact(3)
            .map(|px| ((px[0] as u32 + px[1] as u32 + px[2] as u32) / 3) as u8)
            .collect();
        Template {
            name: name.into(),
            gray,
            width,
            height,
            source_resolution,
        }
    }

    /// Decode a PNG/JPEG reference image from disk, analogous to
    /// `ImageTemplate.from_file` in the source project.
    pub fn from_file(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        source_resolution: (u32, u32),
    ) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgb(name, width, height, img.as_raw(), source_resolution))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn gray(&self) -> &[u8] {
        &self.gray
    }

    /// Template size rescaled to the matching screen's resolution, per
    /// `source_resolution` so a template captured at 960x540 still lines up
    /// against a 1280x720 screenshot.
    pub fn scaled_size_for(&self, screen_width: u32, screen_height: u32) -> (u32, u32) {
        let sx = screen_width as f64 / self.source_resolution.0 as f64;
        let sy = screen_height as f64 / self.source_resolution.1 as f64;
        (
            ((self.width as f64) * sx).round().max(1.0) as u32,
            ((self.height as f64) * sy).round().max(1.0) as u32,
        )
    }

    /// Nearest-neighbor resample of the template's grayscale buffer to a new size.
    pub fn resampled_gray(&self, new_w: u32, new_h: u32) -> Vec<u8> {
        if new_w == self.width && new_h == self.height {
            return self.gray.clone();
        }
        let mut out = vec![0u8; new_w as usize * new_h as usize];
        for ny in 0..new_h {
            let sy = (ny as f64 * self.height as f64 / new_h as f64).floor() as u32;
            let sy = sy.min(self.height - 1);
            for nx in 0..new_w {
                let sx = (nx as f64 * self.width as f64 / new_w as f64).floor() as u32;
                let sx = sx.min(self.width - 1);
                out[(ny * new_w + nx) as usize] = self.gray[(sy * self.width + sx) as usize];
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMatchDetail {
    pub template_name_index: usize,
    pub confidence: f64,
    pub center: (f64, f64),
    pub top_left: (f64, f64),
    pub bottom_right: (f64, f64),
}

#[derive(Debug, Clone, Default)]
pub struct ImageMatchResult {
    pub matched: bool,
    pub rule_name: String,
    pub best: Option<ImageMatchDetail>,
    pub all_details: Vec<ImageMatchDetail>,
}

impl ImageMatchResult {
    pub fn center(&self) -> Option<(f64, f64)> {
        self.best.map(|d| d.center)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.best.map(|d| d.confidence)
    }
}

/// OR semantics across `templates`: any one matching above `confidence` satisfies the rule.
#[derive(Debug, Clone)]
pub struct ImageRule {
    pub name: String,
    pub templates: Vec<Template>,
    pub roi: Roi,
    pub confidence: f64,
    pub method: CorrelationMethod,
}

impl ImageRule {
    pub fn new(name: impl Into<String>, templates: Vec<Template>) -> Self {
        ImageRule {
            name: name.into(),
            templates,
            roi: Roi::full(),
            confidence: 0.85,
            method: CorrelationMethod::CcoeffNormed,
        }
    }

    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = roi;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ImageSignature {
    pub name: String,
    pub rules: Vec<ImageRule>,
    pub strategy: crate::pixel::MatchStrategy,
    pub threshold: usize,
}

/// Match-result engine over templates; mirrors [`crate::pixel::PixelChecker`]'s shape.
pub struct ImageChecker;

impl ImageChecker {
    /// Returns `None` (not an error) when the template is larger than the
    /// cropped ROI, or when no position clears `confidence`.
    pub fn find_template(
        screen: &Screen,
        template: &Template,
        roi: Roi,
        confidence: f64,
        method: CorrelationMethod,
    ) -> Option<ImageMatchDetail> {
        let (rx1, ry1, rx2, ry2) = screen.roi_to_absolute(roi.x1, roi.y1, roi.x2, roi.y2);
        let roi_w = rx2 - rx1;
        let roi_h = ry2 - ry1;

        let (t_w, t_h) = template.scaled_size_for(screen.width(), screen.height());
        if t_w > roi_w || t_h > roi_h {
            return None;
        }
        let t_gray = template.resampled_gray(t_w, t_h);

        let roi_screen = screen.crop_relative(roi.x1, roi.y1, roi.x2, roi.y2);
        let roi_gray = roi_screen.to_grayscale();

        let (best_score, best_x, best_y) =
            best_match_position(&roi_gray, roi_w, roi_h, &t_gray, t_w, t_h, method)?;

        if best_score < confidence {
            return None;
        }

        let abs_x1 = rx1 + best_x;
        let abs_y1 = ry1 + best_y;
        let abs_x2 = abs_x1 + t_w;
        let abs_y2 = abs_y1 + t_h;
        let w = screen.width() as f64;
        let h = screen.height() as f64;

        Some(ImageMatchDetail {
            template_name_index: 0,
            confidence: best_score,
            center: (
                (abs_x1 as f64 + t_w as f64 / 2.0) / w,
                (abs_y1 as f64 + t_h as f64 / 2.0) / h,
            ),
            top_left: (abs_x1 as f64 / w, abs_y1 as f64 / h),
            bottom_right: (abs_x2 as f64 / w, abs_y2 as f64 / h),
        })
    }

    /// OR across a rule's templates; keeps the highest-confidence match.
    pub fn match_rule(screen: &Screen, rule: &ImageRule) -> ImageMatchResult {
        let mut best: Option<ImageMatchDetail> = None;
        for (idx, template) in rule.templates.iter().enumerate() {
            if let Some(mut detail) =
                Self::find_template(screen, template, rule.roi, rule.confidence, rule.method)
            {
                detail.template_name_index = idx;
                if best.map(|b| detail.confidence > b.confidence).unwrap_or(true) {
                    best = Some(detail);
                }
            }
        }
        ImageMatchResult {
            matched: best.is_some(),
            rule_name: rule.name.clone(),
            best,
            all_details: best.into_iter().collect(),
        }
    }

    pub fn check_signature(screen: &Screen, sig: &ImageSignature) -> bool {
        let mut matched_count = 0usize;
        for rule in &sig.rules {
            let matched = Self::match_rule(screen, rule).matched;
            if matched {
                matched_count += 1;
            }
            match sig.strategy {
                crate::pixel::MatchStrategy::All if !matched => return false,
                crate::pixel::MatchStrategy::Any if matched => return true,
                _ => {}
            }
        }
        match sig.strategy {
            crate::pixel::MatchStrategy::All => true,
            crate::pixel::MatchStrategy::Any => matched_count > 0,
            crate::pixel::MatchStrategy::Count => matched_count >= sig.threshold,
        }
    }

    pub fn template_exists(
        screen: &Screen,
        template: &Template,
        roi: Roi,
        confidence: f64,
    ) -> bool {
        Self::find_template(screen, template, roi, confidence, CorrelationMethod::CcoeffNormed)
            .is_some()
    }

    /// Thresholded, non-max-suppressed occurrences of `template` in `screen`.
    /// `min_distance_px` is a Chebyshev radius: no two returned centers have
    /// both |dx| and |dy| below it.
    pub fn find_all_occurrences(
        screen: &Screen,
        template: &Template,
        roi: Roi,
        confidence: f64,
        max_count: usize,
        min_distance_px: u32,
    ) -> Vec<ImageMatchDetail> {
        let (rx1, ry1, rx2, ry2) = screen.roi_to_absolute(roi.x1, roi.y1, roi.x2, roi.y2);
        let roi_w = rx2 - rx1;
        let roi_h = ry2 - ry1;
        let (t_w, t_h) = template.scaled_size_for(screen.width(), screen.height());
        if t_w > roi_w || t_h > roi_h {
            return Vec::new();
        }
        let t_gray = template.resampled_gray(t_w, t_h);
        let roi_screen = screen.crop_relative(roi.x1, roi.y1, roi.x2, roi.y2);
        let roi_gray = roi_screen.to_grayscale();

        let mut candidates =
            all_match_positions(&roi_gray, roi_w, roi_h, &t_gray, t_w, t_h, confidence);
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        let mut kept: Vec<(f64, u32, u32)> = Vec::new();
        for (score, x, y) in candidates {
            let suppressed = kept.iter().any(|&(_, kx, ky)| {
                (x as i64 - kx as i64).unsigned_abs() < min_distance_px as u64
                    && (y as i64 - ky as i64).unsigned_abs() < min_distance_px as u64
            });
            if suppressed {
                continue;
            }
            kept.push((score, x, y));
            if kept.len() >= max_count {
                break;
            }
        }

        let w = screen.width() as f64;
        let h = screen.height() as f64;
        kept.into_iter()
            .map(|(score, x, y)| {
                let abs_x1 = rx1 + x;
                let abs_y1 = ry1 + y;
                ImageMatchDetail {
                    template_name_index: 0,
                    confidence: score,
                    center: (
                        (abs_x1 as f64 + t_w as f64 / 2.0) / w,
                        (abs_y1 as f64 + t_h as f64 / 2.0) / h,
                    ),
                    top_left: (abs_x1 as f64 / w, abs_y1 as f64 / h),
                    bottom_right: (
                        (abs_x1 + t_w) as f64 / w,
                        (abs_y1 + t_h) as f64 / h,
                    ),
                }
            })
            .collect()
    }
}

fn window_stats(gray: &[u8], stride: u32, x0: u32, y0: u32, w: u32, h: u32) -> (f64, f64) {
    let mut sum = 0f64;
    for yy in 0..h {
        let row = (y0 + yy) * stride + x0;
        for xx in 0..w {
            sum += gray[(row + xx) as usize] as f64;
        }
    }
    let n = (w * h) as f64;
    (sum / n, n)
}

fn ccoeff_normed(
    image: &[u8],
    img_stride: u32,
    x0: u32,
    y0: u32,
    template: &[u8],
    t_w: u32,
    t_h: u32,
    t_mean: f64,
) -> f64 {
    let (i_mean, _) = window_stats(image, img_stride, x0, y0, t_w, t_h);
    let mut numer = 0f64;
    let mut i_sq = 0f64;
    let mut t_sq = 0f64;
    for yy in 0..t_h {
        let row = (y0 + yy) * img_stride + x0;
        for xx in 0..t_w {
            let iv = image[(row + xx) as usize] as f64 - i_mean;
            let tv = template[(yy * t_w + xx) as usize] as f64 - t_mean;
            numer += iv * tv;
            i_sq += iv * iv;
            t_sq += tv * tv;
        }
    }
    let denom = (i_sq * t_sq).sqrt();
    if denom < 1e-9 {
        0.0
    } else {
        (numer / denom).clamp(-1.0, 1.0)
    }
}

fn sqdiff(
    image: &[u8],
    img_stride: u32,
    x0: u32,
    y0: u32,
    template: &[u8],
    t_w: u32,
    t_h: u32,
) -> f64 {
    let mut sum = 0f64;
    let mut norm = 0f64;
    for yy in 0..t_h {
        let row = (y0 + yy) * img_stride + x0;
        for xx in 0..t_w {
            let iv = image[(row + xx) as usize] as f64;
            let tv = template[(yy * t_w + xx) as usize] as f64;
            let d = iv - tv;
            sum += d * d;
            norm += iv * iv + tv * tv;
        }
    }
    if norm < 1e-9 {
        1.0
    } else {
        sum / norm
    }
}

fn score_at(
    image: &[u8],
    img_stride: u32,
    x0: u32,
    y0: u32,
    template: &[u8],
    t_w: u32,
    t_h: u32,
    t_mean: f64,
    method: CorrelationMethod,
) -> f64 {
    match method {
        CorrelationMethod::CcoeffNormed => {
            ccoeff_normed(image, img_stride, x0, y0, template, t_w, t_h, t_mean)
        }
        CorrelationMethod::SqDiffNormed => {
            1.0 - sqdiff(image, img_stride, x0, y0, template, t_w, t_h)
        }
        CorrelationMethod::SqDiff => sqdiff(image, img_stride, x0, y0, template, t_w, t_h),
    }
}

fn best_match_position(
    image: &[u8],
    img_w: u32,
    img_h: u32,
    template: &[u8],
    t_w: u32,
    t_h: u32,
    method: CorrelationMethod,
) -> Option<(f64, u32, u32)> {
    if t_w > img_w || t_h > img_h {
        return None;
    }
    let t_mean = template.iter().map(|&v| v as f64).sum::<f64>() / (t_w * t_h) as f64;
    let mut best: Option<(f64, u32, u32)> = None;
    for y0 in 0..=(img_h - t_h) {
        for x0 in 0..=(img_w - t_w) {
            let score = score_at(image, img_w, x0, y0, template, t_w, t_h, t_mean, method);
            if best.map(|(b, _, _)| score > b).unwrap_or(true) {
                best = Some((score, x0, y0));
            }
        }
    }
    best
}

fn all_match_positions(
    image: &[u8],
    img_w: u32,
    img_h: u32,
    template: &[u8],
    t_w: u32,
    t_h: u32,
    confidence: f64,
) -> Vec<(f64, u32, u32)> {
    if t_w > img_w || t_h > img_h {
        return Vec::new();
    }
    let t_mean = template.iter().map(|&v| v as f64).sum::<f64>() / (t_w * t_h) as f64;
    let mut out = Vec::new();
    for y0 in 0..=(img_h - t_h) {
        for x0 in 0..=(img_w - t_w) {
            let score = ccoeff_normed(image, img_w, x0, y0, template, t_w, t_h, t_mean);
            if score >= confidence {
                out.push((score, x0, y0));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = if (x / 4 + y / 4) % 2 == 0 { 20 } else { 220 };
                out.push(v);
                out.push(v);
                out.push(v);
            }
        }
        out
    }

    #[test]
    fn finds_embedded_template_with_high_confidence_and_accurate_center() {
        let screen_w = 64;
        let screen_h = 64;
        let mut rgb = checkerboard(screen_w, screen_h);

        // stamp an 8x8 distinctive patch at (20, 24)
        let patch: Vec<u8> = (0..8 * 8)
            .map(|i| if i % 3 == 0 { 255 } else { 5 })
            .collect();
        for yy in 0..8u32 {
            for xx in 0..8u32 {
                let idx = (((24 + yy) * screen_w + (20 + xx)) * 3) as usize;
                let v = patch[(yy * 8 + xx) as usize];
                rgb[idx] = v;
                rgb[idx + 1] = v;
                rgb[idx + 2] = v;
            }
        }
        let screen = Screen::new(screen_w, screen_h, rgb);
        let template_rgb: Vec<u8> = patch.iter().flat_map(|&v| [v, v, v]).collect();
        let template = Template::from_rgb("patch", 8, 8, &template_rgb, (screen_w, screen_h));

        let detail =
            ImageChecker::find_template(&screen, &template, Roi::full(), 0.95, CorrelationMethod::CcoeffNormed)
                .expect("template should be found");
        assert!(detail.confidence > 0.95);
        let expected_cx = (20.0 + 4.0) / screen_w as f64;
        let expected_cy = (24.0 + 4.0) / screen_h as f64;
        assert!((detail.center.0 - expected_cx).abs() < 1.0 / screen_w as f64);
        assert!((detail.center.1 - expected_cy).abs() < 1.0 / screen_h as f64);
    }

    #[test]
    fn oversized_template_returns_none_not_error() {
        let screen = Screen::new(4, 4, vec![0u8; 4 * 4 * 3]);
        let template = Template::from_rgb("big", 8, 8, &vec![0u8; 8 * 8 * 3], (4, 4));
        assert!(ImageChecker::find_template(&screen, &template, Roi::full(), 0.5, CorrelationMethod::CcoeffNormed).is_none());
    }

    #[test]
    fn find_all_occurrences_respects_min_distance() {
        let w = 40;
        let h = 10;
        let mut rgb = vec![10u8; (w * h * 3) as usize];
        for (cx, cy) in [(5u32, 5u32), (8u32, 5u32), (30u32, 5u32)] {
            for dy in 0..2u32 {
                for dx in 0..2u32 {
                    let idx = (((cy + dy) * w + (cx + dx)) * 3) as usize;
                    rgb[idx] = 250;
                    rgb[idx + 1] = 250;
                    rgb[idx + 2] = 250;
                }
            }
        }
        let screen = Screen::new(w, h, rgb);
        let template = Template::from_rgb("dot", 2, 2, &vec![250u8; 2 * 2 * 3], (w, h));
        let hits = ImageChecker::find_all_occurrences(&screen, &template, Roi::full(), 0.8, 10, 5);
        // the two dots at x=5 and x=8 are within Chebyshev distance 5 and must collapse to one
        assert_eq!(hits.len(), 2);
    }
}
