use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};

use sortie_vision::Screen;
use tracing::warn;

use crate::page::Page;

/// The sole process-wide mutable structure in this system: a write-once,
/// read-many registry of pages. `seal` is called once during startup;
/// subsequent `register` calls panic, matching the "registered once during
/// module initialization, read-only afterwards" invariant.
pub struct PageRegistry {
    pages: RwLock<Vec<Arc<dyn Page>>>,
    sealed: RwLock<bool>,
}

impl PageRegistry {
    fn new() -> Self {
        PageRegistry {
            pages: RwLock::new(Vec::new()),
            sealed: RwLock::new(false),
        }
    }

    pub fn global() -> &'static PageRegistry {
        static REGISTRY: OnceLock<PageRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PageRegistry::new)
    }

    pub fn register(&self, page: Arc<dyn Page>) {
        if *self.sealed.read().unwrap() {
            panic!("PageRegistry::register called after seal()");
        }
        self.pages.write().unwrap().push(page);
    }

    pub fn seal(&self) {
        *self.sealed.write().unwrap() = true;
    }

    /// First page (in registration order) whose `is_current` returns true.
    /// A panicking checker is caught and logged so a single broken page
    /// does not break identification of every other page.
    pub fn get_current_page(&self, screen: &Screen) -> Option<String> {
        let pages = self.pages.read().unwrap();
        for page in pages.iter() {
            let page = Arc::clone(page);
            let result = panic::catch_unwind(AssertUnwindSafe(|| page.is_current(screen)));
            match result {
                Ok(true) => return Some(page.name().to_string()),
                Ok(false) => {}
                Err(_) => {
                    warn!(page = page.name(), "page checker panicked, skipping");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortie_vision::{Color, MatchStrategy, PixelRule, PixelSignature};

    fn solid_screen(color: (u8, u8, u8)) -> Screen {
        let mut data = vec![0u8; 10 * 10 * 3];
        for px in data.chunks_exact_mut(3) {
            px[0] = color.0;
            px[1] = color.1;
            px[2] = color.2;
        }
        Screen::new(10, 10, data)
    }

    struct PanicPage;
    impl Page for PanicPage {
        fn name(&self) -> &str {
            "panics"
        }
        fn is_current(&self, _screen: &Screen) -> bool {
            panic!("boom")
        }
    }

    #[test]
    fn broken_checker_does_not_break_identification() {
        let registry = PageRegistry::new();
        registry.register(Arc::new(PanicPage));
        let sig = PixelSignature::new(
            "ok",
            vec![PixelRule::of(0.5, 0.5, Color::new(9, 9, 9))],
            MatchStrategy::All,
        );
        registry.register(Arc::new(crate::page::SignaturePage::new("ok", sig)));

        let screen = solid_screen((9, 9, 9));
        assert_eq!(registry.get_current_page(&screen), Some("ok".to_string()));
    }

    #[test]
    #[should_panic]
    fn registering_after_seal_panics() {
        let registry = PageRegistry::new();
        registry.seal();
        registry.register(Arc::new(PanicPage));
    }
}
