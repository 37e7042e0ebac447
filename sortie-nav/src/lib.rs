pub mod graph;
pub mod navigator;
pub mod pages;

pub use graph::{NavEdge, NavGraph};
pub use navigator::build_default_graph;
pub use pages::{standard_overlays, standard_pages, NAV_TIMEOUT};
