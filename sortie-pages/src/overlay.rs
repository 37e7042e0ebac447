use sortie_vision::{PixelSignature, Screen};

/// Known overlay kinds, in fixed dismiss priority order: signin > news >
/// retry. The Open Question on overlay priority (spec had no documented
/// order) is resolved this way and checked in exactly this order on every
/// waiter iteration; at most one overlay is dismissed per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverlayKind {
    Signin,
    News,
    Retry,
}

pub struct Overlay {
    pub kind: OverlayKind,
    pub signature: PixelSignature,
    pub dismiss_at: (f64, f64),
}

/// Checks overlays in priority order and returns the first one present.
pub fn detect_overlay<'a>(screen: &Screen, overlays: &'a [Overlay]) -> Option<&'a Overlay> {
    let mut sorted: Vec<&Overlay> = overlays.iter().collect();
    sorted.sort_by_key(|o| o.kind);
    sorted
        .into_iter()
        .find(|o| sortie_vision::PixelChecker::check_signature(screen, &o.signature, false).matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortie_vision::{Color, MatchStrategy, PixelRule};

    fn solid_screen(color: (u8, u8, u8)) -> Screen {
        let mut data = vec![0u8; 10 * 10 * 3];
        for px in data.chunks_exact_mut(3) {
            px[0] = color.0;
            px[1] = color.1;
            px[2] = color.2;
        }
        Screen::new(10, 10, data)
    }

    #[test]
    fn signin_wins_over_news_when_both_present() {
        let sig = |n: &str| {
            PixelSignature::new(
                n,
                vec![PixelRule::of(0.5, 0.5, Color::new(1, 1, 1))],
                MatchStrategy::All,
            )
        };
        let overlays = vec![
            Overlay {
                kind: OverlayKind::News,
                signature: sig("news"),
                dismiss_at: (0.1, 0.1),
            },
            Overlay {
                kind: OverlayKind::Signin,
                signature: sig("signin"),
                dismiss_at: (0.2, 0.2),
            },
        ];
        let screen = solid_screen((1, 1, 1));
        let found = detect_overlay(&screen, &overlays).unwrap();
        assert_eq!(found.kind, OverlayKind::Signin);
    }
}
