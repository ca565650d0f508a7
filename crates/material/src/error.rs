//! Result and Error types for ktools-material

/// Type alias for Result<T, material::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `ktools-material` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to (de)serialise")]
    FailedSerde(#[from] serde_json::Error),

    #[error("inconsistent length for {quantity} (expected {expected:?}, found {found:?})")]
    DimensionMismatch {
        quantity: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{quantity} index {index:?} out of range (must be below {bound:?})")]
    OutOfRange {
        quantity: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("{0} required but not set")]
    MissingDependency(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
