use thiserror::Error;

/// Vision primitives never raise on "not detected" — only on malformed
/// construction inputs reaching this boundary.
#[derive(Debug, Error, PartialEq)]
pub enum VisionError {
    #[error("roi out of range: ({x1}, {y1}) .. ({x2}, {y2})")]
    InvalidRoi {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}
