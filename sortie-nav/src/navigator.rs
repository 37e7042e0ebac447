use std::collections::HashMap;
use std::sync::Arc;

use sortie_pages::{click_and_wait, click_and_wait_submenu, Page};

use crate::graph::NavGraph;
use crate::pages::{standard_overlays, standard_pages, NAV_TIMEOUT, SUBMENU_DELAY};

fn add_edge(
    graph: &mut NavGraph,
    by_name: &HashMap<String, Arc<dyn Page>>,
    from: &str,
    to: &str,
    click: (f64, f64),
) {
    let target = Arc::clone(by_name.get(to).expect("page must be registered"));
    let overlays = standard_overlays();
    let to_owned = to.to_string();
    let from_owned = from.to_string();
    graph.add_edge(from, to, move |device| {
        click_and_wait(
            device,
            click,
            &|screen| target.is_current(screen),
            NAV_TIMEOUT,
            sortie_pages::DEFAULT_INTERVAL,
            &overlays,
            &from_owned,
            &to_owned,
            1,
        )
        .map(|_| ())
    });
}

/// Click -> delay -> click -> verify, for pages reached through a submenu
/// popup (Build, Intensify) rather than a direct single-click transition.
fn add_submenu_edge(
    graph: &mut NavGraph,
    by_name: &HashMap<String, Arc<dyn Page>>,
    from: &str,
    to: &str,
    click: (f64, f64),
    submenu_click: (f64, f64),
) {
    let target = Arc::clone(by_name.get(to).expect("page must be registered"));
    let overlays = standard_overlays();
    let to_owned = to.to_string();
    let from_owned = from.to_string();
    graph.add_edge(from, to, move |device| {
        click_and_wait_submenu(
            device,
            click,
            submenu_click,
            SUBMENU_DELAY,
            &|screen| target.is_current(screen),
            NAV_TIMEOUT,
            sortie_pages::DEFAULT_INTERVAL,
            &overlays,
            &from_owned,
            &to_owned,
            1,
        )
        .map(|_| ())
    });
}

/// Builds the representative navigation graph over [`standard_pages`],
/// wiring each edge as a click at a fixed coordinate followed by
/// `click_and_wait` for the destination page's signature, overlay-aware.
/// Build and Intensify go through a submenu popup instead of a direct click.
pub fn build_default_graph() -> (NavGraph, HashMap<String, Arc<dyn Page>>) {
    let pages = standard_pages();
    let by_name: HashMap<String, Arc<dyn Page>> =
        pages.iter().map(|p| (p.name().to_string(), Arc::clone(p))).collect();

    let mut graph = NavGraph::new();

    add_edge(&mut graph, &by_name, "main", "map", (0.1, 0.9));
    add_edge(&mut graph, &by_name, "main", "sidebar", (0.95, 0.5));
    add_edge(&mut graph, &by_name, "main", "backyard", (0.5, 0.95));
    add_edge(&mut graph, &by_name, "main", "mission", (0.9, 0.05));
    add_submenu_edge(&mut graph, &by_name, "sidebar", "build", (0.1563, 0.3704), (0.375, 0.3704));
    add_submenu_edge(&mut graph, &by_name, "sidebar", "intensify", (0.1563, 0.5), (0.375, 0.5));
    add_edge(&mut graph, &by_name, "sidebar", "friend", (0.5, 0.2));
    add_edge(&mut graph, &by_name, "sidebar", "bath", (0.5, 0.25));
    add_edge(&mut graph, &by_name, "sidebar", "canteen", (0.5, 0.3));
    add_edge(&mut graph, &by_name, "sidebar", "main", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "build", "sidebar", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "intensify", "sidebar", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "friend", "sidebar", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "bath", "sidebar", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "canteen", "sidebar", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "map", "main", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "map", "decisive_battle", (0.9, 0.5));
    add_edge(&mut graph, &by_name, "map", "battle_prep", (0.5, 0.5));
    add_edge(&mut graph, &by_name, "backyard", "main", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "mission", "main", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "decisive_battle", "map", (0.05, 0.05));
    add_edge(&mut graph, &by_name, "battle_prep", "map", (0.05, 0.05));

    (graph, by_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_graph_connects_build_back_to_main() {
        let (graph, _) = build_default_graph();
        let path = graph.bfs_path("build", "main").unwrap();
        assert_eq!(path, vec!["build", "sidebar", "main"]);
    }
}
