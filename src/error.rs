//! Error vocabulary of the widget engine and the dataset binding.
//!
//! Collaborator failures (image decoding, filesystem) travel through
//! [`ViewerError::Other`] untouched; the engine never interprets them.

pub type ViewerResult<T> = Result<T, ViewerError>;

#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("layout '{0}' has no active member")]
    EmptySelection(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViewerError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
