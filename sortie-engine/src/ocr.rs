use sortie_vision::Screen;

/// A single recognized text span with confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrMatch {
    pub text: String,
    pub confidence: f64,
}

/// The OCR engine contract consumed by the core (recognition of ship-drop
/// names, enemy formation labels). No implementation is provided — only
/// the trait boundary and a null object for tests.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, region: &Screen, allowlist: Option<&str>) -> Vec<OcrMatch>;

    fn recognize_single(&self, region: &Screen, allowlist: Option<&str>) -> Option<OcrMatch> {
        self.recognize(region, allowlist)
            .into_iter()
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
    }
}

pub struct NullOcr;

impl OcrEngine for NullOcr {
    fn recognize(&self, _region: &Screen, _allowlist: Option<&str>) -> Vec<OcrMatch> {
        Vec::new()
    }
}

/// The native template-helper-library contract for enemy composition and
/// map-node OCR, consumed but not implemented by this crate.
pub trait EnemyCompositionRecognizer: Send + Sync {
    /// Recognizes ship-type tokens from six grayscale crops (one fixed
    /// anchor grid for fight mode, a different one for exercise mode).
    fn recognize_enemy(&self, crops: &[Screen; 6]) -> Vec<String>;
}

pub struct NullEnemyRecognizer;

impl EnemyCompositionRecognizer for NullEnemyRecognizer {
    fn recognize_enemy(&self, _crops: &[Screen; 6]) -> Vec<String> {
        Vec::new()
    }
}
