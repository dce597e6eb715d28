//! Thread-safe handle to one account.
//!
//! Entry points take `&mut DelegateAccount`, so concurrent callers are serialized by
//! the handle's lock and each entry point observes and produces a consistent state.

use std::sync::{Arc, Mutex};

use crate::{
    account::DelegateAccount,
    error::{AccountError, AccountResult},
};

/// Cloneable, lock-guarded handle to a [`DelegateAccount`].
#[derive(Debug, Clone)]
pub struct SharedAccount {
    inner: Arc<Mutex<DelegateAccount>>,
}

impl SharedAccount {
    /// Wraps `account`.
    #[must_use]
    pub fn new(account: DelegateAccount) -> Self {
        Self {
            inner: Arc::new(Mutex::new(account)),
        }
    }

    /// Runs `op` with exclusive access to the account.
    ///
    /// # Errors
    /// `LockPoisoned` if a previous holder panicked, otherwise whatever `op` returns.
    pub fn with<T>(
        &self,
        op: impl FnOnce(&mut DelegateAccount) -> AccountResult<T>,
    ) -> AccountResult<T> {
        let mut account = self
            .inner
            .lock()
            .map_err(|_| AccountError::LockPoisoned)?;
        op(&mut account)
    }

    /// Copy of the current account state.
    ///
    /// # Errors
    /// `LockPoisoned` if a previous holder panicked.
    pub fn snapshot(&self) -> AccountResult<DelegateAccount> {
        self.with(|account| Ok(account.clone()))
    }
}

impl From<DelegateAccount> for SharedAccount {
    fn from(account: DelegateAccount) -> Self {
        Self::new(account)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use alloy_primitives::Address;

    use super::*;
    use crate::{config::AccountConfig, context::CallContext, events::AccountEvent};

    fn account(guardians: &[Address], threshold: usize) -> DelegateAccount {
        let address = Address::repeat_byte(0xac);
        let mut account = DelegateAccount::new(
            address,
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x7e),
            AccountConfig::default(),
        )
        .unwrap();
        let own = CallContext::internal(address);
        account.initialize(&own, Address::ZERO, guardians).unwrap();
        account.set_recovery_threshold(&own, threshold).unwrap();
        account
    }

    #[test]
    fn test_concurrent_votes_recover_once() {
        let guardians: Vec<Address> = (0x10..0x18).map(Address::repeat_byte).collect();
        let shared = SharedAccount::new(account(&guardians, guardians.len()));
        let successor = Address::repeat_byte(0x99);

        let handles: Vec<_> = guardians
            .iter()
            .map(|guardian| {
                let shared = shared.clone();
                let ctx = CallContext::direct(*guardian);
                thread::spawn(move || {
                    shared.with(|account| account.initiate_recovery(&ctx, successor))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let account = shared.snapshot().unwrap();
        assert_eq!(account.owner(), successor);
        assert_eq!(account.recovery().votes(), 0);
        let recoveries = account
            .events()
            .iter()
            .filter(|event| matches!(event, AccountEvent::RecoverySucceeded { .. }))
            .count();
        assert_eq!(recoveries, 1);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let shared = SharedAccount::from(account(&[Address::repeat_byte(0x10)], 1));
        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            poisoner.with(|_| -> AccountResult<()> { panic!("holder panicked") })
        })
        .join();

        assert_eq!(shared.snapshot().unwrap_err(), AccountError::LockPoisoned);
    }
}
