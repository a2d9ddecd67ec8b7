use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum EngineError {
    #[error("Transport timed out: {0}")]
    TransportTimeout(String),

    #[error("No response from node: {0}")]
    NoResponse(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Transport rejected command: {0}")]
    TransportFailure(String),

    #[error("Capability not supported: {0}")]
    UnsupportedCapability(String),

    #[error("Value {value} out of range for {context}")]
    ValueOutOfRange { value: f64, context: String },

    #[error("Missing topology role: {0}")]
    MissingTopologyRole(&'static str),

    #[error("Settings migration was already applied to this device")]
    MigrationGuardViolation,

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Unknown device model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl EngineError {
    /// Build a [`EngineError::ValueOutOfRange`] for the given context.
    pub fn out_of_range(value: f64, context: impl Into<String>) -> Self {
        EngineError::ValueOutOfRange {
            value,
            context: context.into(),
        }
    }

    /// Build a [`EngineError::InvalidSetting`].
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether a request that failed with this error may be issued again.
    ///
    /// Field devices intermittently drop configuration queries; only these
    /// link-level conditions are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::TransportTimeout(_)
                | EngineError::NoResponse(_)
                | EngineError::MalformedResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
