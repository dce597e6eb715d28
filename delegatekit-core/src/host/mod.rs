//! Platform interfaces the account depends on: outbound calls, the clock, and
//! journaled rollback.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

mod memory;

pub use memory::{CallRecord, InMemoryHost};

/// One outbound operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Callee.
    pub target: Address,
    /// Value transferred with the call.
    pub value: U256,
    /// Call data.
    pub payload: Bytes,
}

impl Call {
    /// Builds a call.
    #[must_use]
    pub fn new(target: Address, value: U256, payload: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            payload: payload.into(),
        }
    }
}

/// Result of an outbound call as observed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Whether the callee completed without reverting.
    pub success: bool,
    /// Return data, or revert data on failure.
    pub output: Bytes,
}

impl CallOutcome {
    /// A successful call returning `output`.
    #[must_use]
    pub fn success(output: impl Into<Bytes>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// A reverted call with revert data `output`.
    #[must_use]
    pub fn failure(output: impl Into<Bytes>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Handle for a host journal checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub usize);

/// Environment an account executes against.
///
/// Implementations must give `call` sub-call semantics: a call that reports failure
/// has applied none of its own effects. Snapshots nest; `revert_to` discards every
/// effect since the snapshot was taken, `commit` keeps them and releases the snapshot.
pub trait Host {
    /// Current time in seconds since the Unix epoch.
    fn timestamp(&self) -> u64;

    /// Opens a checkpoint.
    fn snapshot(&mut self) -> SnapshotId;

    /// Undoes every effect applied since `id` was opened, and releases it.
    fn revert_to(&mut self, id: SnapshotId);

    /// Keeps every effect applied since `id` was opened, and releases it.
    fn commit(&mut self, id: SnapshotId);

    /// Performs `call` on behalf of `from`.
    fn call(&mut self, from: Address, call: &Call) -> CallOutcome;

    /// Moves `value` from `from` to `to` outside any call, as when value is attached
    /// to an entry point. Returns `false`, with no effect, if `from` cannot cover it.
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool;
}
