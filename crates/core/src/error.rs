#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid significance threshold: {0} m")]
    InvalidThreshold(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Animation queue was cancelled")]
    Cancelled,

    #[error("UI thread unavailable: {0}")]
    UiThread(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
