use thiserror::Error;

/// Everything that can go wrong before a simulation starts
///
/// All variants are raised while validating input, never mid-run. Once a simulator has been
/// constructed, replaying a trace through it cannot fail
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Malformed trace elements, or a non-positive capacity or associativity
    #[error("validation error: {0}")]
    Validation(String),

    /// Mapping parameters which leave the cache without a usable set
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A policy or mapping identifier which isn't recognised
    #[error("unsupported policy: {0}")]
    UnsupportedPolicy(String),

    #[error("couldn't read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("couldn't parse the config file: {0}")]
    Json(#[from] serde_json::Error),
}
