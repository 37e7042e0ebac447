use std::sync::Arc;
use std::time::Duration;

use sortie_pages::{Overlay, Page, SignaturePage};
use sortie_vision::{Color, MatchStrategy, PixelRule, PixelSignature};

/// The representative page set named by the navigation graph in the source
/// project: Main, Map, Mission, Backyard, Sidebar, Build, Intensify, Friend,
/// Bath, Canteen, DecisiveBattle, BattlePrep. Each is backed by a single
/// pixel signature; deeper per-page state reads (fleet lists, expedition
/// panels, …) are out of scope — only enough to identify the page and
/// drive the navigator.
pub fn standard_pages() -> Vec<Arc<dyn Page>> {
    let page = |name: &str, x: f64, y: f64, color: (u8, u8, u8)| {
        let sig = PixelSignature::new(
            name,
            vec![PixelRule::of(x, y, Color::new(color.0, color.1, color.2))],
            MatchStrategy::All,
        );
        Arc::new(SignaturePage::new(name, sig)) as Arc<dyn Page>
    };

    vec![
        page("main", 0.05, 0.05, (210, 180, 90)),
        page("map", 0.05, 0.90, (40, 80, 140)),
        page("mission", 0.90, 0.05, (230, 210, 60)),
        page("backyard", 0.50, 0.95, (80, 150, 80)),
        page("sidebar", 0.95, 0.50, (60, 60, 60)),
        page("build", 0.50, 0.10, (180, 140, 40)),
        page("intensify", 0.50, 0.15, (140, 40, 40)),
        page("friend", 0.50, 0.20, (40, 140, 200)),
        page("bath", 0.50, 0.25, (200, 200, 240)),
        page("canteen", 0.50, 0.30, (230, 160, 60)),
        page("decisive_battle", 0.50, 0.35, (140, 20, 20)),
        page("battle_prep", 0.50, 0.92, (20, 60, 20)),
    ]
}

/// Known overlays, checked in fixed priority order (signin > news > retry)
/// by `sortie_pages::wait_for_page`.
pub fn standard_overlays() -> Vec<Overlay> {
    let sig = |name: &str, x: f64, y: f64| {
        PixelSignature::new(
            name,
            vec![PixelRule::of(x, y, Color::new(250, 250, 250))],
            MatchStrategy::All,
        )
    };
    vec![
        Overlay {
            kind: sortie_pages::OverlayKind::Signin,
            signature: sig("signin_overlay", 0.5, 0.6),
            dismiss_at: (0.5, 0.75),
        },
        Overlay {
            kind: sortie_pages::OverlayKind::News,
            signature: sig("news_overlay", 0.5, 0.5),
            dismiss_at: (0.9, 0.1),
        },
        Overlay {
            kind: sortie_pages::OverlayKind::Retry,
            signature: sig("retry_overlay", 0.5, 0.45),
            dismiss_at: (0.5, 0.6),
        },
    ]
}

pub const NAV_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between the nav click and the submenu click for two-step pages
/// (Build, Intensify), matching how long the submenu popup takes to open.
pub const SUBMENU_DELAY: Duration = Duration::from_millis(1250);
