//! Outbound execution: owner, batch, signature-authorized and sponsored.

use alloy_primitives::{Address, Bytes, U256};

use super::DelegateAccount;
use crate::{
    config::BatchPolicy,
    context::CallContext,
    error::{AccountError, AccountResult},
    events::AccountEvent,
    host::{Call, CallOutcome, Host},
    signature::{meta_digest, recover_signer},
};

impl DelegateAccount {
    /// Performs `call` on behalf of the owner and returns its output.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if value tracking is on and the attached value differs
    ///   from `call.value`.
    /// - `InvalidArgument` if the caller cannot cover the attached value.
    /// - `LimitExceeded` if the spending cap would be breached; the call is not made.
    /// - `ExecutionFailed` if the call reverts.
    pub fn execute(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        call: &Call,
    ) -> AccountResult<Bytes> {
        self.atomically_with_host(host, |account, host| {
            account.ensure_owner_or_self(ctx)?;
            account.ensure_attached_value(ctx, call.value)?;
            account.collect_attached_value(ctx, host)?;
            let outcome = account.charge_and_call(host, call)?;
            if !outcome.success {
                return Err(AccountError::ExecutionFailed {
                    target: call.target,
                    output: outcome.output,
                });
            }
            Ok(outcome.output)
        })
    }

    /// Performs one call per index of the three parallel slices, in order.
    ///
    /// Under [`BatchPolicy::Strict`] the first failure aborts and rolls back the whole
    /// batch. Under [`BatchPolicy::BestEffort`] every element is attempted and the
    /// returned flags report which ones succeeded; an element that would breach the
    /// spending cap is reported as failed and not attempted.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller passes the owner-or-self guard.
    /// - `InvalidArgument` if the slices differ in length, or value tracking is on and
    ///   the attached value differs from the sum of `values`.
    /// - `InvalidArgument` if the caller cannot cover the attached value.
    /// - Strict only: `BatchLimitExceeded` or `BatchCallFailed` for the first failing
    ///   element.
    pub fn execute_batch(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        targets: &[Address],
        values: &[U256],
        payloads: &[Bytes],
    ) -> AccountResult<Vec<bool>> {
        self.atomically_with_host(host, |account, host| {
            account.ensure_owner_or_self(ctx)?;
            if targets.len() != values.len() || targets.len() != payloads.len() {
                return Err(AccountError::invalid(
                    "batch",
                    format!(
                        "length mismatch: {} targets, {} values, {} payloads",
                        targets.len(),
                        values.len(),
                        payloads.len()
                    ),
                ));
            }
            let total = values
                .iter()
                .try_fold(U256::ZERO, |sum, value| sum.checked_add(*value))
                .ok_or_else(|| AccountError::invalid("values", "sum overflows"))?;
            account.ensure_attached_value(ctx, total)?;
            account.collect_attached_value(ctx, host)?;

            let calls = targets
                .iter()
                .zip(values)
                .zip(payloads)
                .map(|((target, value), payload)| Call::new(*target, *value, payload.clone()));

            let mut results = Vec::with_capacity(targets.len());
            for (index, call) in calls.enumerate() {
                let success = match account.config.batch_policy {
                    BatchPolicy::Strict => {
                        let outcome =
                            account
                                .charge_and_call(host, &call)
                                .map_err(|err| match err {
                                    AccountError::LimitExceeded {
                                        requested,
                                        remaining,
                                    } => AccountError::BatchLimitExceeded {
                                        index,
                                        requested,
                                        remaining,
                                    },
                                    other => other,
                                })?;
                        if !outcome.success {
                            return Err(AccountError::BatchCallFailed {
                                index,
                                output: outcome.output,
                            });
                        }
                        true
                    }
                    BatchPolicy::BestEffort => account.try_call(host, &call),
                };
                results.push(success);
            }
            log::debug!(
                "account {}: batch of {} with {} failures",
                account.address,
                results.len(),
                results.iter().filter(|ok| !**ok).count()
            );
            Ok(results)
        })
    }

    /// Performs `call` authorized by the owner's `signature` over
    /// [`meta_digest`]`(call, nonce)`. Anyone may submit it.
    ///
    /// The outbound call's failure is recorded, not enforced: the nonce stays consumed
    /// and `Ok(false)` is returned.
    ///
    /// # Errors
    /// - `InvalidArgument` if value tracking is on and the attached value differs
    ///   from `call.value`.
    /// - `SignatureInvalid` if the signature is malformed or not the owner's.
    /// - `NonceAlreadyUsed` if `nonce` was consumed before.
    /// - `LimitExceeded` if the spending cap would be breached; the call is not made.
    pub fn meta_execute(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        call: &Call,
        nonce: U256,
        signature: &[u8],
    ) -> AccountResult<bool> {
        self.atomically_with_host(host, |account, host| {
            account.ensure_attached_value(ctx, call.value)?;
            account.collect_attached_value(ctx, host)?;
            let digest = meta_digest(call.target, call.value, &call.payload, nonce);
            let signer = recover_signer(&digest, signature)?;
            if signer != account.state.owner {
                log::warn!(
                    "account {}: meta-execution signed by {signer}, not the owner",
                    account.address
                );
                return Err(AccountError::SignatureInvalid(format!(
                    "signer {signer} is not the owner"
                )));
            }
            if !account.state.used_nonces.insert(nonce) {
                return Err(AccountError::NonceAlreadyUsed { nonce });
            }

            let spending = account.state.spending.clone();
            let mark = account.events.len();
            let outcome = account.charge_and_call(host, call)?;
            if !outcome.success {
                account.state.spending = spending;
                account.events.truncate(mark);
            }
            account.emit(AccountEvent::MetaExecuted {
                relayer: ctx.caller,
                target: call.target,
                value: call.value,
                nonce,
                success: outcome.success,
            });
            Ok(outcome.success)
        })
    }

    /// Performs `call` on the sponsor's initiative and returns its output.
    ///
    /// # Errors
    /// - `Unauthorized` unless the caller is the approved sponsor.
    /// - `InvalidArgument` if value tracking is on and the attached value differs
    ///   from `call.value`.
    /// - `InvalidArgument` if the caller cannot cover the attached value.
    /// - `LimitExceeded` if the spending cap would be breached; the call is not made.
    /// - `SponsoredExecutionFailed` if the call reverts.
    pub fn sponsored_execute(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        call: &Call,
    ) -> AccountResult<Bytes> {
        self.atomically_with_host(host, |account, host| {
            account.ensure_sponsor(ctx)?;
            account.ensure_attached_value(ctx, call.value)?;
            account.collect_attached_value(ctx, host)?;
            let outcome = account.charge_and_call(host, call)?;
            if !outcome.success {
                return Err(AccountError::SponsoredExecutionFailed {
                    target: call.target,
                    output: outcome.output,
                });
            }
            Ok(outcome.output)
        })
    }

    /// Charges value-bearing calls against the cap, then performs the call.
    fn charge_and_call(
        &mut self,
        host: &mut dyn Host,
        call: &Call,
    ) -> AccountResult<CallOutcome> {
        if !call.value.is_zero() {
            if let Some(charge) = self.state.spending.charge(call.value, host.timestamp())? {
                self.emit(AccountEvent::SpendingRecorded {
                    amount: charge.amount,
                    spent_today: charge.spent_today,
                    day: charge.day,
                });
            }
        }
        Ok(host.call(self.address, call))
    }

    /// Best-effort element: a failed charge or call leaves no trace and yields `false`.
    fn try_call(&mut self, host: &mut dyn Host, call: &Call) -> bool {
        let spending = self.state.spending.clone();
        let mark = self.events.len();
        match self.charge_and_call(host, call) {
            Ok(outcome) if outcome.success => true,
            _ => {
                self.state.spending = spending;
                self.events.truncate(mark);
                false
            }
        }
    }
}
