use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnsearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid search options: {0}")]
    InvalidOptions(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("{backend} returned {status}: {body}")]
    Http {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("{backend} rejected the request: {message}")]
    Rejected {
        backend: &'static str,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, UnsearchError>;

impl From<serde_json::Error> for UnsearchError {
    fn from(e: serde_json::Error) -> Self {
        UnsearchError::Json(e.to_string())
    }
}

impl From<reqwest::Error> for UnsearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UnsearchError::Json(e.to_string())
        } else {
            UnsearchError::Transport(e.to_string())
        }
    }
}

impl UnsearchError {
    /// True for errors raised while validating caller input, before any
    /// backend was contacted.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            UnsearchError::Config(_)
                | UnsearchError::InvalidOptions(_)
                | UnsearchError::InvalidDocument(_)
                | UnsearchError::MissingField(_)
        )
    }
}
