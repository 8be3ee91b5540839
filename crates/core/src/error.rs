#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
