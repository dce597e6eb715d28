//! Owner-managed configuration: setup, guardians, threshold, sponsor, cap, logic.

use alloy_primitives::{Address, U256};

use super::DelegateAccount;
use crate::{
    context::CallContext,
    error::{AccountError, AccountResult},
    events::AccountEvent,
    upgrade::{LogicPointer, LogicRegistry},
};

impl DelegateAccount {
    /// One-time setup: approves `sponsor` (unless zero) and adds `guardians`, skipping
    /// zero and repeated entries.
    ///
    /// # Errors
    /// - `AlreadyInitialized` on any call after the first successful one.
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    pub fn initialize(
        &mut self,
        ctx: &CallContext,
        sponsor: Address,
        guardians: &[Address],
    ) -> AccountResult<()> {
        self.atomically(|account| {
            if account.state.initialized {
                return Err(AccountError::AlreadyInitialized);
            }
            account.ensure_owner_or_self(ctx)?;

            if !sponsor.is_zero() {
                account.state.sponsor = Some(sponsor);
                account.emit(AccountEvent::SponsorSet {
                    sponsor: Some(sponsor),
                });
            }
            for guardian in guardians.iter().filter(|g| !g.is_zero()) {
                account.insert_guardian(*guardian);
            }

            account.state.initialized = true;
            account.emit(AccountEvent::Initialized { by: ctx.caller });
            log::info!(
                "account {} initialized by {} with {} guardians",
                account.address,
                ctx.caller,
                account.guardian_count()
            );
            Ok(())
        })
    }

    /// Approves `sponsor` for sponsored execution. The zero address clears it.
    ///
    /// # Errors
    /// `Unauthorized` unless the caller passes the owner-or-self guard.
    pub fn set_approved_sponsor(
        &mut self,
        ctx: &CallContext,
        sponsor: Address,
    ) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_owner_or_self(ctx)?;
            let sponsor = (!sponsor.is_zero()).then_some(sponsor);
            account.state.sponsor = sponsor;
            account.emit(AccountEvent::SponsorSet { sponsor });
            Ok(())
        })
    }

    /// Adds `guardian`. Adding an existing guardian is a no-op.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if `guardian` is the zero address.
    pub fn add_guardian(&mut self, ctx: &CallContext, guardian: Address) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_owner_or_self(ctx)?;
            if guardian.is_zero() {
                return Err(AccountError::invalid("guardian", "zero address"));
            }
            account.insert_guardian(guardian);
            Ok(())
        })
    }

    /// Removes `guardian`. A vote it already cast in the active round still counts.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if `guardian` is not a guardian.
    pub fn remove_guardian(
        &mut self,
        ctx: &CallContext,
        guardian: Address,
    ) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_owner_or_self(ctx)?;
            if !account.state.guardians.remove(&guardian) {
                return Err(AccountError::invalid(
                    "guardian",
                    format!("{guardian} is not a guardian"),
                ));
            }
            account.emit(AccountEvent::GuardianRemoved { guardian });
            Ok(())
        })
    }

    /// Sets the number of guardian votes needed to recover the account.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if `threshold` is zero or exceeds the guardian count.
    pub fn set_recovery_threshold(
        &mut self,
        ctx: &CallContext,
        threshold: usize,
    ) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_owner_or_self(ctx)?;
            if threshold == 0 {
                return Err(AccountError::invalid("threshold", "must be positive"));
            }
            if threshold > account.guardian_count() {
                return Err(AccountError::invalid(
                    "threshold",
                    format!(
                        "{threshold} exceeds guardian count {}",
                        account.guardian_count()
                    ),
                ));
            }
            account.state.recovery_threshold = threshold;
            account.emit(AccountEvent::RecoveryThresholdUpdated { threshold });
            Ok(())
        })
    }

    /// Sets the daily spending cap. Zero disables enforcement.
    ///
    /// # Errors
    /// `Unauthorized` unless the caller passes the owner-or-self guard.
    pub fn set_daily_limit(&mut self, ctx: &CallContext, limit: U256) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_owner_or_self(ctx)?;
            account.state.spending.set_daily_limit(limit);
            account.emit(AccountEvent::DailyLimitUpdated { limit });
            Ok(())
        })
    }

    /// Checks whether the caller may re-point this instance at `implementation`, and
    /// returns the pointer it would get.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if `implementation` is zero, this instance, or unknown to
    ///   `registry`.
    /// - `VersionMismatch` if it does not declare the pinned version.
    pub fn authorize_upgrade(
        &self,
        ctx: &CallContext,
        implementation: Address,
        registry: &LogicRegistry,
    ) -> AccountResult<LogicPointer> {
        self.ensure_owner_or_self(ctx)?;
        registry.resolve(
            self.address,
            implementation,
            &self.config.expected_logic_version,
        )
    }

    /// Re-points this instance at `implementation` after [`Self::authorize_upgrade`]
    /// accepts it. Persistent state is kept.
    ///
    /// # Errors
    /// See [`Self::authorize_upgrade`].
    pub fn upgrade_to(
        &mut self,
        ctx: &CallContext,
        implementation: Address,
        registry: &LogicRegistry,
    ) -> AccountResult<()> {
        self.atomically(|account| {
            let logic = account.authorize_upgrade(ctx, implementation, registry)?;
            log::info!(
                "account {} upgraded to {} ({})",
                account.address,
                logic.implementation,
                logic.version
            );
            account.emit(AccountEvent::Upgraded {
                implementation: logic.implementation,
                version: logic.version.clone(),
            });
            account.state.logic = logic;
            Ok(())
        })
    }

    fn insert_guardian(&mut self, guardian: Address) {
        if self.state.guardians.insert(guardian) {
            self.emit(AccountEvent::GuardianAdded { guardian });
        }
    }
}
