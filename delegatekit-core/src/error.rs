use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::context::Role;

/// Result type for every account and factory entry point.
pub type AccountResult<T, E = AccountError> = std::result::Result<T, E>;

/// Error outputs from `DelegateKit`
///
/// A failed entry point never leaves partial state behind: by the time one of these
/// errors reaches the caller, the account (and the host, for executing entry points)
/// is exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum AccountError {
    /// The caller does not hold the role required by the entry point.
    #[error("unauthorized: {caller} is not {role}")]
    Unauthorized {
        /// Immediate caller of the entry point.
        caller: Address,
        /// Role the entry point requires.
        role: Role,
    },
    /// The one-time setup call already ran for this instance.
    #[error("already_initialized")]
    AlreadyInitialized,
    /// The presented input is not valid for the requested operation.
    #[error("invalid_argument: {attribute}: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The guardian already voted in the current recovery round.
    #[error("duplicate_vote: {guardian}")]
    DuplicateVote {
        /// Guardian that tried to vote twice.
        guardian: Address,
    },
    /// A different successor is already proposed in the active recovery round.
    #[error("proposal_conflict: {proposed} is in flight, got {requested}")]
    ProposalConflict {
        /// Successor of the active round.
        proposed: Address,
        /// Successor the caller asked for.
        requested: Address,
    },
    /// The daily spending cap would be exceeded.
    #[error("limit_exceeded: requested {requested}, remaining {remaining}")]
    LimitExceeded {
        /// Value the call tried to spend.
        requested: U256,
        /// Headroom left in the current day bucket.
        remaining: U256,
    },
    /// An element of a strict batch would exceed the daily spending cap; the whole
    /// batch was rolled back.
    #[error("batch_limit_exceeded: index {index} requested {requested}, remaining {remaining}")]
    BatchLimitExceeded {
        /// Position of the element over the cap.
        index: usize,
        /// Value the element tried to spend.
        requested: U256,
        /// Headroom left in the current day bucket.
        remaining: U256,
    },
    /// An owner-initiated outbound call failed.
    #[error("execution_failed: call to {target} reverted with {output}")]
    ExecutionFailed {
        /// Target of the failed call.
        target: Address,
        /// Return data of the failed call.
        output: Bytes,
    },
    /// An element of a strict batch failed; the whole batch was rolled back.
    #[error("batch_call_failed: index {index} reverted with {output}")]
    BatchCallFailed {
        /// Position of the first failing element.
        index: usize,
        /// Return data of the failed element.
        output: Bytes,
    },
    /// A sponsor-initiated outbound call failed.
    #[error("sponsored_execution_failed: call to {target} reverted with {output}")]
    SponsoredExecutionFailed {
        /// Target of the failed call.
        target: Address,
        /// Return data of the failed call.
        output: Bytes,
    },
    /// The signature is malformed or was not produced by the owner.
    #[error("signature_invalid: {0}")]
    SignatureInvalid(String),
    /// The meta-execution nonce was already consumed.
    #[error("nonce_already_used: {nonce}")]
    NonceAlreadyUsed {
        /// Replayed nonce.
        nonce: U256,
    },
    /// The factory already created an instance for these parameters.
    #[error("duplicate_deployment: key {key} already deployed at {existing}")]
    DuplicateDeployment {
        /// Derived deployment key.
        key: B256,
        /// Address of the existing instance.
        existing: Address,
    },
    /// The new logic does not declare the pinned version.
    #[error("version_mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version the instance accepts.
        expected: String,
        /// Version the candidate logic declares.
        found: String,
    },
    /// A configuration document could not be parsed.
    #[error("invalid_config: {0}")]
    InvalidConfig(String),
    /// The per-instance lock was poisoned by a panicking holder.
    #[error("lock_poisoned")]
    LockPoisoned,
}

impl AccountError {
    pub(crate) fn invalid(attribute: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidConfig(error.to_string())
    }
}
