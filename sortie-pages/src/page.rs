use sortie_vision::Screen;

/// A single identifiable UI screen. Implementations are expected to be
/// stateless — they hold no device reference, only the pixel/template
/// signature that identifies them.
pub trait Page: Send + Sync {
    fn name(&self) -> &str;
    fn is_current(&self, screen: &Screen) -> bool;
}

/// A `Page` backed by one pixel signature, the common case throughout the
/// registry (mirrors the source project's per-page `is_current_page`
/// static method backed by a single `PixelSignature`).
pub struct SignaturePage {
    name: String,
    signature: sortie_vision::PixelSignature,
}

impl SignaturePage {
    pub fn new(name: impl Into<String>, signature: sortie_vision::PixelSignature) -> Self {
        SignaturePage {
            name: name.into(),
            signature,
        }
    }
}

impl Page for SignaturePage {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_current(&self, screen: &Screen) -> bool {
        sortie_vision::PixelChecker::check_signature(screen, &self.signature, false).matched
    }
}
