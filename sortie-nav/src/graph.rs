use std::collections::{HashMap, HashSet, VecDeque};

use sortie_device::Device;
use sortie_pages::NavigationError;

/// A single click-then-verify transition between two named pages.
pub struct NavEdge {
    pub to: String,
    pub action: Box<dyn Fn(&dyn Device) -> Result<(), NavigationError> + Send + Sync>,
}

/// A directed multigraph of pages; data, not pointers — nodes are plain
/// strings, edges live in an adjacency map, and a path is a `Vec<String>`
/// value rather than any linked structure.
#[derive(Default)]
pub struct NavGraph {
    edges: HashMap<String, Vec<NavEdge>>,
}

impl NavGraph {
    pub fn new() -> Self {
        NavGraph::default()
    }

    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        action: impl Fn(&dyn Device) -> Result<(), NavigationError> + Send + Sync + 'static,
    ) {
        self.edges.entry(from.into()).or_default().push(NavEdge {
            to: to.into(),
            action: Box::new(action),
        });
    }

    /// Breadth-first path as a list of node names from `source` to `target`
    /// inclusive. `None` if unreachable. `source == target` yields a
    /// single-element path with no transitions to perform.
    pub fn bfs_path(&self, source: &str, target: &str) -> Option<Vec<String>> {
        if source == target {
            return Some(vec![source.to_string()]);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(source);
        let mut queue: VecDeque<Vec<&str>> = VecDeque::new();
        queue.push_back(vec![source]);

        while let Some(path) = queue.pop_front() {
            let current = *path.last().unwrap();
            let Some(edges) = self.edges.get(current) else {
                continue;
            };
            for edge in edges {
                let next = edge.to.as_str();
                if visited.contains(next) {
                    continue;
                }
                // mark visited before enqueueing to avoid duplicate paths to the same node
                visited.insert(next);
                let mut next_path = path.clone();
                next_path.push(next);
                if next == target {
                    return Some(next_path.into_iter().map(str::to_string).collect());
                }
                queue.push_back(next_path);
            }
        }
        None
    }

    /// Executes each edge action along the BFS path from `source` to
    /// `target`, stopping at the first failure.
    pub fn navigate(
        &self,
        device: &dyn Device,
        source: &str,
        target: &str,
    ) -> Result<(), NavigationError> {
        let path = self.bfs_path(source, target).ok_or_else(|| NavigationError::Timeout {
            source: source.to_string(),
            target: target.to_string(),
            timeout_s: 0.0,
            last_seen: None,
        })?;

        for pair in path.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let edge = self
                .edges
                .get(from)
                .and_then(|edges| edges.iter().find(|e| &e.to == to))
                .expect("bfs_path only returns traversable edges");
            (edge.action)(device)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn source_equals_target_is_empty_transition() {
        let graph = NavGraph::new();
        assert_eq!(graph.bfs_path("main", "main"), Some(vec!["main".to_string()]));
    }

    #[test]
    fn finds_shortest_path_across_multiple_edges() {
        let mut graph = NavGraph::new();
        graph.add_edge("main", "map", |_| Ok(()));
        graph.add_edge("main", "sidebar", |_| Ok(()));
        graph.add_edge("sidebar", "build", |_| Ok(()));
        graph.add_edge("map", "build", |_| Ok(()));

        let path = graph.bfs_path("main", "build").unwrap();
        assert_eq!(path.len(), 3, "should take the 2-hop path, not a longer one");
        assert_eq!(path[0], "main");
        assert_eq!(*path.last().unwrap(), "build");
    }

    #[test]
    fn unreachable_target_returns_none() {
        let mut graph = NavGraph::new();
        graph.add_edge("main", "map", |_| Ok(()));
        assert_eq!(graph.bfs_path("main", "canteen"), None);
    }

    #[test]
    fn navigate_executes_each_edge_action_once() {
        let mut graph = NavGraph::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        graph.add_edge("main", "map", move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let device = sortie_device::MockDevice::new(
            sortie_device::DeviceInfo { width: 1, height: 1 },
            vec![],
        );
        graph.navigate(&device, "main", "map").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
