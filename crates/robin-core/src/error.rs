use thiserror::Error;

#[derive(Debug, Error)]
pub enum RobinError {
    /// A collaborator was called outside its documented precondition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Context extraction could not build a Context for an automated message.
    #[error("Context extraction failed: {0}")]
    ExtractionFailed(String),

    /// A reply strategy (or the follow-up decider) produced no output.
    #[error("Reply generation failed: {0}")]
    GenerationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RobinError {
    /// Short, stable error code string for CLI output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            RobinError::InvalidState(_) => "INVALID_STATE",
            RobinError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            RobinError::GenerationFailed(_) => "GENERATION_FAILED",
            RobinError::Config(_) => "CONFIG_ERROR",
            RobinError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RobinError>;
