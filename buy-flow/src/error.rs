use thiserror::Error;

use crate::validation::{FieldError, SelectionError, SignInErrors};

/// Errors raised by the buy-flow engine
#[derive(Debug, Error)]
pub enum BuyFlowError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Phone not found: {0}")]
    PhoneNotFound(String),

    #[error(transparent)]
    InvalidField(#[from] FieldError),

    #[error(transparent)]
    InvalidSelection(#[from] SelectionError),

    #[error(transparent)]
    InvalidSignIn(#[from] SignInErrors),

    #[error("Collaborator request failed: {0}")]
    Collaborator(String),

    #[error("Request superseded: {0}")]
    Superseded(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BuyFlowError>;
