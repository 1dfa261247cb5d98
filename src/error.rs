//! Error types for the Prolog bridge

use std::fmt::Display;

use thiserror::Error;

/// Main error type for marshalling and query execution
#[derive(Error, Debug)]
pub enum PlError {
    // Goal assembly errors
    #[error("goal expected")]
    EmptyGoal,

    // Forward conversion errors
    #[error("unsupported value kind: {0}")]
    UnsupportedValue(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    // Reverse conversion errors
    #[error("unsupported term: {0}")]
    UnsupportedTerm(String),

    // Engine errors
    #[error("engine rejected goal '{goal}': {message}")]
    Submission { goal: String, message: String },

    #[error("failed to read bindings: {0}")]
    Scan(String),

    #[error("engine fault: {0}")]
    Fault(String),

    // Serde custom messages
    #[error("{0}")]
    Custom(String),

    // Config errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the Prolog bridge
pub type PlResult<T> = Result<T, PlError>;

impl PlError {
    /// Build a submission error for `goal`
    pub fn submission(goal: impl Into<String>, message: impl Display) -> Self {
        PlError::Submission {
            goal: goal.into(),
            message: message.to_string(),
        }
    }

    /// Turn a caught panic payload into a fault
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        PlError::Fault(message)
    }
}

impl serde::ser::Error for PlError {
    fn custom<T: Display>(msg: T) -> Self {
        PlError::Custom(msg.to_string())
    }
}

impl serde::de::Error for PlError {
    fn custom<T: Display>(msg: T) -> Self {
        PlError::Custom(msg.to_string())
    }
}

impl From<serde_json::Error> for PlError {
    fn from(err: serde_json::Error) -> Self {
        PlError::InvalidConfig(err.to_string())
    }
}

impl From<serde_yaml::Error> for PlError {
    fn from(err: serde_yaml::Error) -> Self {
        PlError::InvalidConfig(err.to_string())
    }
}
