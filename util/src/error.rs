use thiserror::Error;

/// The failure type shared by every fallible Quarry operation.
///
/// Verifier rejections are values of this type (`ProofTooShort`,
/// `ProofInvalid`); they are ordinary outcomes, not bugs. Call-order
/// violations of internal contracts are panics, not `Error`s.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A precondition on setup parameters was violated.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Division by zero, missing inverse, or no subgroup of the requested
    /// size.
    #[error("arithmetic domain error: {0}")]
    ArithmeticDomain(String),

    /// The composition polynomial exceeded its declared degree bound.
    #[error("composition polynomial degree overflow: {0}")]
    ConstraintOverflow(String),

    /// The verifier ran past the end of the proof bytes.
    #[error("proof too short: needed {needed} more bytes")]
    ProofTooShort { needed: usize },

    /// A verifier check failed; the message names the check.
    #[error("proof invalid: {0}")]
    ProofInvalid(String),

    /// An unknown field, hash or domain name appeared in the configuration.
    #[error("unknown configuration value: {0}")]
    ConfigUnknown(String),
}

pub type Result<T> = core::result::Result<T, Error>;
