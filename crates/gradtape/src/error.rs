//! Error types for gradtape.

use thiserror::Error;

/// Errors that can occur while recording or differentiating.
#[derive(Debug, Error)]
pub enum GradientError {
    /// Traversal reached an operation with no registered gradient rule.
    #[error("no gradient registered for op type `{op_type}`")]
    UnregisteredGradient { op_type: String },

    /// An op type was registered twice.
    #[error("gradient already registered for op type `{op_type}`")]
    DuplicateRegistration { op_type: String },

    /// A non-persistent tape was used after `compute_gradient`.
    #[error("tape already consumed by compute_gradient; construct a persistent tape to reuse it")]
    TapeConsumed,

    /// Element counts of two tensors disagree.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// An op or gradient rule received the wrong number of operands.
    #[error("op `{op_type}` expects {expected} operand(s), got {actual}")]
    ArityMismatch {
        op_type: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A non-empty seed list must supply one gradient per target.
    #[error("expected one seed gradient per target: {targets} target(s), {seeds} seed(s)")]
    SeedCountMismatch { targets: usize, seeds: usize },

    /// An op-type name did not match any known operation.
    #[error("unknown op type `{name}`")]
    UnknownOpType { name: String },
}
