use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Why a single AI-path attempt did not produce a usable answer.
///
/// Never surfaced to callers: the engine matches on it and runs the
/// heuristic path instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiFailure {
    #[error("AI path disabled: no language model configured")]
    Disabled,

    #[error("language model call failed: {0}")]
    Capability(String),

    #[error("could not normalize model output: {0}")]
    Normalization(String),
}

impl AiFailure {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AiFailure::Disabled => "disabled",
            AiFailure::Capability(_) => "capability",
            AiFailure::Normalization(_) => "normalization",
        }
    }
}
