use thiserror::Error;

/// Errors surfaced at the core boundary (section 7 of the design doc).
///
/// Constraint violations during the search are rejections, not errors: they
/// never appear here. Only the compiler's up-front validation, self-test
/// failures, and device faults do.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Raised by the constraint compiler before any device work is scheduled.
    #[error("invalid search specification: {0}")]
    Specification(String),

    /// The hasher disagreed with a known test vector, or a reported match
    /// failed host re-derivation. Indicates a codec or compiler bug.
    #[error("hash self-test failed: {0}")]
    HashMismatch(String),

    /// Propagated from the (simulated) compute runtime; non-recoverable for
    /// the session.
    #[error("device fault: {0}")]
    Device(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
