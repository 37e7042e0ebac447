use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device {serial} produced no frame within {timeout_s:.1}s")]
    Timeout { serial: String, timeout_s: f64 },
    #[error("device {serial} shell command failed: {message}")]
    ShellFailed { serial: String, message: String },
    #[error("device {serial} is not connected")]
    NotConnected { serial: String },
}
