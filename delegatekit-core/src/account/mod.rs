//! The delegate account: one owner, a guardian set, an optional sponsor and spending
//! cap, and the entry points that act on them.
//!
//! Every entry point takes the [`CallContext`] of its invocation. Entry points that
//! mutate state run atomically: on error the account state and event log are
//! restored, and for executing entry points the host is reverted to where it was
//! when the entry point started.

use std::collections::HashSet;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    config::AccountConfig,
    context::{AuthPolicy, CallContext, Role},
    error::{AccountError, AccountResult},
    events::AccountEvent,
    guardians::GuardianSet,
    host::Host,
    recovery::RecoveryRound,
    signature::signature_result_code,
    spending::SpendingLimit,
    upgrade::LogicPointer,
};

mod admin;
mod execution;
mod recovery;


/// Threshold an account starts with before it is configured.
pub const DEFAULT_RECOVERY_THRESHOLD: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AccountState {
    owner: Address,
    guardians: GuardianSet,
    recovery_threshold: usize,
    recovery: RecoveryRound,
    sponsor: Option<Address>,
    spending: SpendingLimit,
    initialized: bool,
    logic: LogicPointer,
    used_nonces: HashSet<U256>,
}

/// A delegated account instance.
#[derive(Debug, Clone)]
pub struct DelegateAccount {
    address: Address,
    config: AccountConfig,
    state: AccountState,
    events: Vec<AccountEvent>,
}

impl DelegateAccount {
    /// Allocates an uninitialized account at `address`, owned by `owner` and bound to
    /// the logic at `implementation`, which is taken to declare the configured
    /// expected version.
    ///
    /// The account must still be set up with [`DelegateAccount::initialize`].
    ///
    /// # Errors
    /// `InvalidArgument` if `address` or `owner` is the zero address.
    pub fn new(
        address: Address,
        owner: Address,
        implementation: Address,
        config: AccountConfig,
    ) -> AccountResult<Self> {
        if address.is_zero() {
            return Err(AccountError::invalid("address", "zero address"));
        }
        if owner.is_zero() {
            return Err(AccountError::invalid("owner", "zero address"));
        }
        let logic = LogicPointer {
            implementation,
            version: config.expected_logic_version.clone(),
        };
        Ok(Self {
            address,
            config,
            state: AccountState {
                owner,
                guardians: GuardianSet::default(),
                recovery_threshold: DEFAULT_RECOVERY_THRESHOLD,
                recovery: RecoveryRound::default(),
                sponsor: None,
                spending: SpendingLimit::default(),
                initialized: false,
                logic,
                used_nonces: HashSet::new(),
            },
            events: Vec::new(),
        })
    }

    /// Address of this instance.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Behavior switches of this instance.
    #[must_use]
    pub const fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.state.owner
    }

    /// Approved sponsor, if any.
    #[must_use]
    pub const fn sponsor(&self) -> Option<Address> {
        self.state.sponsor
    }

    /// Returns `true` once `initialize` has run.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Returns `true` if `who` is a guardian.
    #[must_use]
    pub fn is_guardian(&self, who: &Address) -> bool {
        self.state.guardians.contains(who)
    }

    /// Number of guardians.
    #[must_use]
    pub fn guardian_count(&self) -> usize {
        self.state.guardians.len()
    }

    /// Guardian at `index` of the enumerable list. Order is not stable across removals.
    ///
    /// # Errors
    /// `InvalidArgument` if `index` is out of bounds.
    pub fn guardian_at(&self, index: usize) -> AccountResult<Address> {
        self.state.guardians.get(index).ok_or_else(|| {
            AccountError::invalid(
                "index",
                format!("{index} out of bounds for {} guardians", self.guardian_count()),
            )
        })
    }

    /// Guardians in enumeration order.
    #[must_use]
    pub fn guardians(&self) -> &[Address] {
        self.state.guardians.as_slice()
    }

    /// Votes needed to complete a recovery.
    #[must_use]
    pub const fn recovery_threshold(&self) -> usize {
        self.state.recovery_threshold
    }

    /// Voting state of the current recovery round.
    #[must_use]
    pub const fn recovery(&self) -> &RecoveryRound {
        &self.state.recovery
    }

    /// Spending cap state.
    #[must_use]
    pub const fn spending(&self) -> &SpendingLimit {
        &self.state.spending
    }

    /// Logic target this instance is bound to.
    #[must_use]
    pub const fn logic(&self) -> &LogicPointer {
        &self.state.logic
    }

    /// Returns `true` if a meta-execution already consumed `nonce`.
    #[must_use]
    pub fn is_nonce_used(&self, nonce: &U256) -> bool {
        self.state.used_nonces.contains(nonce)
    }

    /// Notifications emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[AccountEvent] {
        &self.events
    }

    /// Signature-validation result code: the magic value when `signature` over `hash`
    /// recovers to the owner, `0xffffffff` otherwise.
    #[must_use]
    pub fn is_valid_signature(&self, hash: &B256, signature: &[u8]) -> [u8; 4] {
        signature_result_code(self.state.owner, hash, signature)
    }

    fn emit(&mut self, event: AccountEvent) {
        log::debug!("account {}: {event:?}", self.address);
        self.events.push(event);
    }

    fn ensure_owner_or_self(&self, ctx: &CallContext) -> AccountResult<()> {
        let owner_identity = match self.config.auth_policy {
            AuthPolicy::DirectCaller => ctx.caller,
            AuthPolicy::Originator => ctx.origin,
        };
        if ctx.caller == self.address || owner_identity == self.state.owner {
            return Ok(());
        }
        Err(AccountError::Unauthorized {
            caller: ctx.caller,
            role: Role::OwnerOrSelf,
        })
    }

    fn ensure_guardian(&self, ctx: &CallContext) -> AccountResult<()> {
        if self.state.guardians.contains(&ctx.caller) {
            return Ok(());
        }
        Err(AccountError::Unauthorized {
            caller: ctx.caller,
            role: Role::Guardian,
        })
    }

    fn ensure_sponsor(&self, ctx: &CallContext) -> AccountResult<()> {
        if self.state.sponsor == Some(ctx.caller) {
            return Ok(());
        }
        Err(AccountError::Unauthorized {
            caller: ctx.caller,
            role: Role::Sponsor,
        })
    }

    fn ensure_attached_value(&self, ctx: &CallContext, declared: U256) -> AccountResult<()> {
        if self.config.value_tracking && ctx.value != declared {
            return Err(AccountError::invalid(
                "value",
                format!("attached {} but declared {declared}", ctx.value),
            ));
        }
        Ok(())
    }

    /// Moves the value attached to the invocation from the caller into this account.
    fn collect_attached_value(
        &self,
        ctx: &CallContext,
        host: &mut dyn Host,
    ) -> AccountResult<()> {
        if ctx.value.is_zero() || ctx.caller == self.address {
            return Ok(());
        }
        if !host.transfer(ctx.caller, self.address, ctx.value) {
            return Err(AccountError::invalid(
                "value",
                format!("{} cannot cover attached {}", ctx.caller, ctx.value),
            ));
        }
        Ok(())
    }

    /// Runs `op` so that a failure leaves account state and the event log untouched.
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> AccountResult<T>,
    ) -> AccountResult<T> {
        let state = self.state.clone();
        let events = self.events.len();
        let result = op(self);
        if result.is_err() {
            self.state = state;
            self.events.truncate(events);
        }
        result
    }

    /// Like [`Self::atomically`], additionally reverting the host on failure.
    fn atomically_with_host<T>(
        &mut self,
        host: &mut dyn Host,
        op: impl FnOnce(&mut Self, &mut dyn Host) -> AccountResult<T>,
    ) -> AccountResult<T> {
        let snapshot = host.snapshot();
        let result = self.atomically(|account| op(account, &mut *host));
        match &result {
            Ok(_) => host.commit(snapshot),
            Err(err) => {
                log::debug!("account {}: reverting, {err}", self.address);
                host.revert_to(snapshot);
            }
        }
        result
    }
}
