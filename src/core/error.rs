use thiserror::Error;

/// Rule field names, used to pinpoint validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
pub enum Field {
    #[strum(serialize = "protocol")]
    Protocol,
    #[strum(serialize = "src")]
    Src,
    #[strum(serialize = "s_port")]
    SPort,
    #[strum(serialize = "dst")]
    Dst,
    #[strum(serialize = "d_port")]
    DPort,
    #[strum(serialize = "action")]
    Action,
}

/// Core error types for fwlens
#[derive(Debug, Error)]
pub enum Error {
    /// A rule field failed construction-time validation.
    ///
    /// `position` is the offending rule's index in the ordered list.
    #[error("Validation error in rule {position}, field {field}: {message}")]
    Validation {
        position: usize,
        field: Field,
        message: String,
    },

    /// A line of ingested text could not be interpreted as a rule record
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A packet specification could not be interpreted
    #[error("Invalid packet specification: {0}")]
    Packet(String),

    /// I/O operation failed (CLI file reads/writes only; the core performs no I/O)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a validation failure on one rule field.
    pub fn validation(position: usize, field: Field, message: impl Into<String>) -> Self {
        Error::Validation {
            position,
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
