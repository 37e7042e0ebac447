use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("navigation from {source} to {target} timed out after {timeout_s:.1}s, last seen page: {last_seen:?}")]
    Timeout {
        source: String,
        target: String,
        timeout_s: f64,
        last_seen: Option<String>,
    },
}
