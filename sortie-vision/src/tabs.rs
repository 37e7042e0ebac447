use crate::color::Color;
use crate::screen::Screen;

/// One sampled point in a horizontal tab bar.
#[derive(Debug, Clone, Copy)]
pub struct TabProbe {
    pub x: f64,
    pub y: f64,
}

/// A tab bar is identified by exactly one probe matching the "active" (blue)
/// palette while every other probe matches the "inactive" (dark) palette.
#[derive(Debug, Clone)]
pub struct TabBar {
    pub probes: Vec<TabProbe>,
    pub dark: Color,
    pub blue: Color,
    pub tolerance: f64,
}

impl TabBar {
    /// Index of the single active (blue) probe, if the bar is in a
    /// recognizable state (exactly one blue, rest dark).
    pub fn active_tab_index(&self, screen: &Screen) -> Option<usize> {
        let mut active = None;
        for (i, probe) in self.probes.iter().enumerate() {
            let actual = screen.get_pixel(probe.x, probe.y);
            let is_blue = actual.near(&self.blue, self.tolerance);
            let is_dark = actual.near(&self.dark, self.tolerance);
            if is_blue {
                if active.is_some() {
                    return None; // more than one active probe: unrecognized state
                }
                active = Some(i);
            } else if !is_dark {
                return None; // neither dark nor blue: unrecognized state
            }
        }
        active
    }

    pub fn is_tabbed_page(&self, screen: &Screen) -> bool {
        self.active_tab_index(screen).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: (u8, u8, u8)) -> Screen {
        let mut data = vec![0u8; (width * height * 3) as usize];
        for px in data.chunks_exact_mut(3) {
            px[0] = color.0;
            px[1] = color.1;
            px[2] = color.2;
        }
        Screen::new(width, height, data)
    }

    #[test]
    fn active_index_requires_exactly_one_blue() {
        let mut screen = solid(100, 20, (30, 30, 30));
        // paint probe 2 blue
        let probes = vec![
            TabProbe { x: 0.1, y: 0.5 },
            TabProbe { x: 0.3, y: 0.5 },
            TabProbe { x: 0.5, y: 0.5 },
        ];
        let bar = TabBar {
            probes,
            dark: Color::new(30, 30, 30),
            blue: Color::new(50, 120, 220),
            tolerance: 10.0,
        };
        assert_eq!(bar.active_tab_index(&screen), None);

        // now paint the second probe's pixel blue
        let x = (0.3 * 100.0) as u32;
        let y = 10u32;
        let idx = ((y * 100 + x) * 3) as usize;
        let data = screen.data().to_vec();
        let mut data = data;
        data[idx] = 50;
        data[idx + 1] = 120;
        data[idx + 2] = 220;
        screen = Screen::new(100, 20, data);
        assert_eq!(bar.active_tab_index(&screen), Some(1));
    }
}
