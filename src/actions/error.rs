//! Action-sequence error types.

use thiserror::Error;

/// An action violated the grammar or frontier contract.
///
/// Raised by [`ActionSequence::eval`](super::ActionSequence::eval) and the
/// construction/materialization paths built on it. A decode path catches
/// this locally and reports `None`; ground-truth construction propagates it
/// as a hard failure (it indicates a dataset/grammar mismatch).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidActionError {
    #[error("no open slot remains: the sequence is already complete")]
    SequenceComplete,

    #[error("an expand rule cannot fill a token-constrained slot")]
    RuleOnTokenSlot,

    #[error("a token cannot fill a node- or variadic-constrained slot")]
    TokenOnNonTokenSlot,

    #[error("close-variadic-field applied to a non-variadic slot")]
    CloseNonVariadicSlot,

    #[error("a leaf value can only appear under a token-constrained field")]
    LeafOutsideTokenField,

    #[error("the sequence is incomplete and cannot be materialized")]
    IncompleteSequence,

    #[error("the action log does not form a well-shaped tree")]
    MalformedSequence,
}

/// Result type for action-sequence operations.
pub type Result<T> = std::result::Result<T, InvalidActionError>;
