use thiserror::Error;

/// The common error type used by this crate
///
/// Contract violations (invoking an operation on a variant that cannot
/// support it) are not represented here; they panic.
#[derive(Error, Debug)]
pub enum DialogCogError {
    /// A cog could not be built from the inputs it was given
    #[error("Invalid cog construction: {0}")]
    InvalidConstruction(String),

    /// A published tree does not uphold a structural invariant
    #[error("Cog invariant violated: {0}")]
    InvariantViolation(String),

    /// The source of tuples failed while a buffer was being built
    #[error("Failed to build buffer: {0}")]
    Buffer(String),

    /// Rewrite settings were rejected
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}
