// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown contract: {0}")]
    UnknownContract(String),

    #[error("Unknown placeholder {{{placeholder}}} in \"{input}\"")]
    UnknownPlaceholder { placeholder: String, input: String },

    #[error("Invalid method signature \"{signature}\": {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("Invalid argument for {param}: {reason}")]
    InvalidArgument { param: String, reason: String },

    #[error("Argument count mismatch for {method}: expected {expected}, got {actual}")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Too many actions: {count} (max {max})")]
    TooManyActions { count: usize, max: usize },

    #[error("Encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
