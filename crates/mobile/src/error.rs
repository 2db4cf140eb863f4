use shuttle_core::CoreError;

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MarkerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<CoreError> for MarkerError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidCoordinate { .. }
            | CoreError::InvalidThreshold(_)
            | CoreError::InvalidConfig(_) => MarkerError::InvalidInput(error.to_string()),
            CoreError::Cancelled | CoreError::UiThread(_) => {
                MarkerError::Unavailable(error.to_string())
            }
        }
    }
}
