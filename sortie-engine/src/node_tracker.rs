use std::collections::HashMap;

/// The reference resolution map coordinates are authored against before
/// being normalized to relatives on load.
pub const SOURCE_WIDTH: u32 = 960;
pub const SOURCE_HEIGHT: u32 = 540;

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub position: (f64, f64),
    pub next_nodes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MapNodeData {
    pub nodes: HashMap<String, NodeInfo>,
}

impl MapNodeData {
    /// Builds from `{name: (x_px, y_px), next: [...]}` entries expressed at
    /// [`SOURCE_WIDTH`]x[`SOURCE_HEIGHT`], normalizing to relative coords.
    pub fn from_pixel_positions(entries: Vec<(String, (f64, f64), Vec<String>)>) -> Self {
        let nodes = entries
            .into_iter()
            .map(|(name, (px, py), next_nodes)| {
                (
                    name,
                    NodeInfo {
                        position: (px / SOURCE_WIDTH as f64, py / SOURCE_HEIGHT as f64),
                        next_nodes,
                    },
                )
            })
            .collect();
        MapNodeData { nodes }
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    (dx * dx + dy * dy).sqrt()
}

/// Tracks the fleet's current map node by nearest-neighbor template
/// matching of the fleet icon against known node positions. Re-assignment
/// is short-circuited when the detected position hasn't moved since the
/// last update.
#[derive(Debug, Clone)]
pub struct NodeTracker {
    map: MapNodeData,
    current_node: String,
    last_position: Option<(f64, f64)>,
}

impl NodeTracker {
    pub fn new(map: MapNodeData) -> Self {
        NodeTracker {
            map,
            current_node: "0".to_string(),
            last_position: None,
        }
    }

    pub fn reset(&mut self) {
        self.current_node = "0".to_string();
        self.last_position = None;
    }

    pub fn current_node(&self) -> &str {
        &self.current_node
    }

    /// Updates tracked node given a freshly detected fleet-icon position
    /// (relative coords), or `None` if the icon wasn't found this frame.
    /// Returns the (possibly unchanged) current node name.
    pub fn update(&mut self, detected: Option<(f64, f64)>) -> &str {
        let Some(pos) = detected else {
            return &self.current_node;
        };

        if self.last_position == Some(pos) {
            return &self.current_node;
        }
        self.last_position = Some(pos);

        let restricted: Vec<&String> = self
            .map
            .nodes
            .get(&self.current_node)
            .filter(|info| !info.next_nodes.is_empty())
            .map(|info| info.next_nodes.iter().collect())
            .unwrap_or_else(|| self.map.nodes.keys().filter(|n| n.as_str() != "0").collect());

        if let Some(nearest) = restricted
            .into_iter()
            .filter_map(|name| self.map.nodes.get(name).map(|info| (name, info.position)))
            .min_by(|(_, a), (_, b)| {
                distance(pos, *a)
                    .partial_cmp(&distance(pos, *b))
                    .unwrap()
            })
            .map(|(name, _)| name.clone())
        {
            self.current_node = nearest;
        }

        &self.current_node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> MapNodeData {
        MapNodeData::from_pixel_positions(vec![
            ("0".to_string(), (0.0, 0.0), vec!["A".to_string()]),
            ("A".to_string(), (480.0, 270.0), vec!["B".to_string(), "C".to_string()]),
            ("B".to_string(), (288.0, 216.0), vec![]),
            ("C".to_string(), (672.0, 216.0), vec![]),
        ])
    }

    #[test]
    fn unchanged_position_does_not_recompute() {
        let map = sample_map();
        let mut tracker = NodeTracker::new(map);
        tracker.update(Some((0.5, 0.5)));
        let first = tracker.current_node().to_string();
        tracker.update(Some((0.5, 0.5)));
        assert_eq!(tracker.current_node(), first);
    }

    #[test]
    fn moves_to_nearest_restricted_candidate() {
        let map = sample_map();
        let mut tracker = NodeTracker::new(map);
        tracker.update(Some((0.5, 0.5))); // near A
        assert_eq!(tracker.current_node(), "A");
        tracker.update(Some((0.71, 0.42))); // near C (0.7, 0.4), not B (0.3, 0.4)
        assert_eq!(tracker.current_node(), "C");
    }
}
