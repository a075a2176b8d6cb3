use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("storage unavailable: {0}")]
    Unavailable(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),
}

impl From<serde_json::Error> for CoreError {
    fn from(_: serde_json::Error) -> Self {
        CoreError::Invalid("json")
    }
}
