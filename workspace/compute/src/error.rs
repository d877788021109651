use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// A spending policy with percentages outside 0..=100 or summing above 100
    #[error("Invalid spending policy: {0}")]
    InvalidPolicy(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
