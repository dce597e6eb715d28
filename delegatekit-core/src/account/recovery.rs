//! Guardian-driven owner recovery.

use alloy_primitives::Address;

use super::DelegateAccount;
use crate::{
    context::CallContext,
    error::{AccountError, AccountResult},
    events::AccountEvent,
    recovery::VoteOutcome,
};

impl DelegateAccount {
    /// Casts the calling guardian's vote to make `new_owner` the owner.
    ///
    /// The first vote of a round fixes the successor; later votes must name the same
    /// one. When the tally reaches the recovery threshold the owner is swapped and the
    /// round resets, clearing every guardian's vote.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is not a guardian.
    /// - `InvalidArgument` if `new_owner` is the zero address.
    /// - `DuplicateVote` if the caller already voted in this round.
    /// - `ProposalConflict` if another successor is being voted on.
    pub fn initiate_recovery(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_guardian(ctx)?;
            let threshold = account.state.recovery_threshold;
            let outcome = account.state.recovery.vote(ctx.caller, new_owner, threshold)?;

            let votes = match outcome {
                VoteOutcome::Pending { votes } | VoteOutcome::Completed { votes, .. } => votes,
            };
            account.emit(AccountEvent::RecoveryProposed {
                guardian: ctx.caller,
                new_owner,
                votes,
            });

            if let VoteOutcome::Completed { new_owner, .. } = outcome {
                let old_owner = std::mem::replace(&mut account.state.owner, new_owner);
                log::info!(
                    "account {} recovered: owner {old_owner} -> {new_owner} with {votes} votes",
                    account.address
                );
                account.emit(AccountEvent::RecoverySucceeded {
                    old_owner,
                    new_owner,
                });
                account.emit(AccountEvent::OwnerUpdated {
                    old_owner,
                    new_owner,
                });
            }
            Ok(())
        })
    }

    /// Abandons the active recovery round, clearing its proposal and every vote.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if no round is active.
    pub fn cancel_recovery(&mut self, ctx: &CallContext) -> AccountResult<()> {
        self.atomically(|account| {
            account.ensure_owner_or_self(ctx)?;
            let proposed = account
                .state
                .recovery
                .reset()
                .ok_or_else(|| AccountError::invalid("recovery", "no active round"))?;
            account.emit(AccountEvent::RecoveryCancelled { proposed });
            Ok(())
        })
    }
}
