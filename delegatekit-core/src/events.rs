//! Append-only notifications emitted by accounts and the factory.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Notifications emitted by a delegate account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccountEvent {
    /// One-time setup completed.
    Initialized {
        /// Identity that performed setup.
        by: Address,
    },
    /// A guardian joined the set.
    GuardianAdded {
        /// New guardian.
        guardian: Address,
    },
    /// A guardian left the set.
    GuardianRemoved {
        /// Removed guardian.
        guardian: Address,
    },
    /// The recovery threshold changed.
    RecoveryThresholdUpdated {
        /// New threshold.
        threshold: usize,
    },
    /// A guardian voted for a successor owner.
    RecoveryProposed {
        /// Voting guardian.
        guardian: Address,
        /// Proposed successor.
        new_owner: Address,
        /// Running tally after this vote.
        votes: usize,
    },
    /// The owner cancelled the active recovery round.
    RecoveryCancelled {
        /// Successor that was being voted on.
        proposed: Address,
    },
    /// A recovery round reached its threshold.
    RecoverySucceeded {
        /// Owner before the swap.
        old_owner: Address,
        /// Owner after the swap.
        new_owner: Address,
    },
    /// The owner identity changed.
    OwnerUpdated {
        /// Owner before the change.
        old_owner: Address,
        /// Owner after the change.
        new_owner: Address,
    },
    /// The approved sponsor changed. `None` clears it.
    SponsorSet {
        /// New sponsor.
        sponsor: Option<Address>,
    },
    /// The daily spending cap changed.
    DailyLimitUpdated {
        /// New cap; zero disables enforcement.
        limit: U256,
    },
    /// A value-bearing execution was charged against the cap.
    SpendingRecorded {
        /// Charged value.
        amount: U256,
        /// Total spent in the current day bucket.
        spent_today: U256,
        /// Day bucket of the charge.
        day: u64,
    },
    /// A signature-authorized execution ran.
    MetaExecuted {
        /// Identity that submitted the meta-execution.
        relayer: Address,
        /// Call target.
        target: Address,
        /// Call value.
        value: U256,
        /// Consumed nonce.
        nonce: U256,
        /// Whether the outbound call succeeded.
        success: bool,
    },
    /// The logic pointer moved.
    Upgraded {
        /// New logic target.
        implementation: Address,
        /// Version tag of the new logic.
        version: String,
    },
}

/// Notifications emitted by the instance factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FactoryEvent {
    /// A new instance was created.
    WalletDeployed {
        /// Address of the new instance.
        wallet: Address,
        /// Owner set.
        owners: Vec<Address>,
        /// Guardian set.
        guardians: Vec<Address>,
        /// Recovery threshold.
        threshold: usize,
        /// CREATE2 salt used.
        salt: B256,
    },
}
