//! Authorization context threaded through every account entry point.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who is invoking an entry point, on whose behalf, and with what attached value.
///
/// `caller` is the immediate invoker. `origin` is the external identity that started
/// the call chain; for a direct call both are the same. Keeping both explicit lets the
/// account decide, per [`AuthPolicy`], which one the owner check looks at instead of
/// reading an ambient "transaction origin".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Immediate invoker of the entry point.
    pub caller: Address,
    /// Original external invoker of the call chain.
    pub origin: Address,
    /// Value attached to the invocation.
    pub value: U256,
}

impl CallContext {
    /// A call made directly by `caller`, with no value attached.
    #[must_use]
    pub const fn direct(caller: Address) -> Self {
        Self {
            caller,
            origin: caller,
            value: U256::ZERO,
        }
    }

    /// The account re-entering itself. Satisfies the owner-or-self guard.
    #[must_use]
    pub const fn internal(account: Address) -> Self {
        Self::direct(account)
    }

    /// Replaces the original invoker of the chain.
    #[must_use]
    pub const fn with_origin(mut self, origin: Address) -> Self {
        self.origin = origin;
        self
    }

    /// Attaches `value` to the invocation.
    #[must_use]
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// How the owner-or-self guard identifies the owner.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuthPolicy {
    /// The immediate caller must be the owner (or the account itself).
    #[default]
    DirectCaller,
    /// The original invoker of the chain must be the owner (or the caller is the
    /// account itself). Any intermediate contract the owner calls into can act with
    /// owner authority under this policy.
    Originator,
}

/// Authorization classes guarding entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Role {
    /// The owner, or the account acting on itself.
    #[strum(serialize = "owner_or_self")]
    OwnerOrSelf,
    /// A member of the guardian set.
    #[strum(serialize = "guardian")]
    Guardian,
    /// The approved sponsor.
    #[strum(serialize = "sponsor")]
    Sponsor,
}
