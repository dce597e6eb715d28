//! In-memory reference host: balances, scripted targets, and a call journal.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use super::{Call, CallOutcome, Host, SnapshotId};

/// A call the host applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Sender.
    pub from: Address,
    /// Applied call.
    pub call: Call,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    balances: HashMap<Address, U256>,
    journal: Vec<CallRecord>,
}

/// Host backed by process memory.
///
/// Every call moves `value` from the sender to the target and appends to the journal.
/// A call fails without effects when the sender cannot cover `value` or the target
/// was marked with [`InMemoryHost::fail_target`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    now: u64,
    ledger: Ledger,
    snapshots: Vec<Ledger>,
    failing: HashSet<Address>,
    responses: HashMap<Address, Bytes>,
}

impl InMemoryHost {
    /// Creates an empty host with its clock at `now`.
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Moves the clock to `now`.
    pub fn set_timestamp(&mut self, now: u64) {
        self.now = now;
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&mut self, seconds: u64) {
        self.now = self.now.saturating_add(seconds);
    }

    /// Credits `amount` to `who`.
    pub fn fund(&mut self, who: Address, amount: U256) {
        let balance = self.ledger.balances.entry(who).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Balance of `who`.
    #[must_use]
    pub fn balance_of(&self, who: &Address) -> U256 {
        self.ledger.balances.get(who).copied().unwrap_or_default()
    }

    /// Makes every call to `target` revert.
    pub fn fail_target(&mut self, target: Address) {
        self.failing.insert(target);
    }

    /// Sets the data returned by successful calls to `target`.
    pub fn respond_with(&mut self, target: Address, output: impl Into<Bytes>) {
        self.responses.insert(target, output.into());
    }

    /// Calls applied so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> &[CallRecord] {
        &self.ledger.journal
    }
}

impl Host for InMemoryHost {
    fn timestamp(&self) -> u64 {
        self.now
    }

    fn snapshot(&mut self) -> SnapshotId {
        self.snapshots.push(self.ledger.clone());
        SnapshotId(self.snapshots.len() - 1)
    }

    fn revert_to(&mut self, id: SnapshotId) {
        if id.0 >= self.snapshots.len() {
            return;
        }
        self.snapshots.truncate(id.0 + 1);
        if let Some(ledger) = self.snapshots.pop() {
            self.ledger = ledger;
        }
    }

    fn commit(&mut self, id: SnapshotId) {
        self.snapshots.truncate(id.0);
    }

    fn call(&mut self, from: Address, call: &Call) -> CallOutcome {
        if self.failing.contains(&call.target) {
            return CallOutcome::failure(Bytes::from_static(b"reverted"));
        }
        let available = self.balance_of(&from);
        if call.value > available {
            return CallOutcome::failure(Bytes::from_static(b"insufficient balance"));
        }
        if !call.value.is_zero() {
            self.ledger.balances.insert(from, available - call.value);
            let credit = self.ledger.balances.entry(call.target).or_default();
            *credit = credit.saturating_add(call.value);
        }
        self.ledger.journal.push(CallRecord {
            from,
            call: call.clone(),
        });
        CallOutcome::success(self.responses.get(&call.target).cloned().unwrap_or_default())
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool {
        let available = self.balance_of(&from);
        if value > available {
            return false;
        }
        if !value.is_zero() && from != to {
            self.ledger.balances.insert(from, available - value);
            let credit = self.ledger.balances.entry(to).or_default();
            *credit = credit.saturating_add(value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_call_moves_value_and_journals() {
        let mut host = InMemoryHost::new(0);
        host.fund(id(1), U256::from(10));
        host.respond_with(id(2), Bytes::from_static(&[0xab]));

        let outcome = host.call(id(1), &Call::new(id(2), U256::from(4), Bytes::new()));
        assert!(outcome.success);
        assert_eq!(outcome.output, Bytes::from_static(&[0xab]));
        assert_eq!(host.balance_of(&id(1)), U256::from(6));
        assert_eq!(host.balance_of(&id(2)), U256::from(4));
        assert_eq!(host.journal().len(), 1);
    }

    #[test]
    fn test_failed_call_has_no_effects() {
        let mut host = InMemoryHost::new(0);
        host.fund(id(1), U256::from(1));
        host.fail_target(id(3));

        assert!(!host.call(id(1), &Call::new(id(3), U256::ZERO, Bytes::new())).success);
        assert!(!host.call(id(1), &Call::new(id(2), U256::from(2), Bytes::new())).success);
        assert!(host.journal().is_empty());
        assert_eq!(host.balance_of(&id(1)), U256::from(1));
    }

    #[test]
    fn test_transfer_moves_value_without_journal() {
        let mut host = InMemoryHost::new(0);
        host.fund(id(1), U256::from(10));

        assert!(host.transfer(id(1), id(2), U256::from(7)));
        assert!(!host.transfer(id(1), id(2), U256::from(4)));
        assert!(host.transfer(id(3), id(2), U256::ZERO));
        assert_eq!(host.balance_of(&id(1)), U256::from(3));
        assert_eq!(host.balance_of(&id(2)), U256::from(7));
        assert!(host.journal().is_empty());
    }

    #[test]
    fn test_nested_snapshots() {
        let mut host = InMemoryHost::new(0);
        host.fund(id(1), U256::from(10));

        let outer = host.snapshot();
        host.call(id(1), &Call::new(id(2), U256::from(1), Bytes::new()));
        let inner = host.snapshot();
        host.call(id(1), &Call::new(id(2), U256::from(2), Bytes::new()));
        host.revert_to(inner);
        assert_eq!(host.balance_of(&id(2)), U256::from(1));

        let inner = host.snapshot();
        host.call(id(1), &Call::new(id(2), U256::from(3), Bytes::new()));
        host.commit(inner);
        assert_eq!(host.balance_of(&id(2)), U256::from(4));

        host.revert_to(outer);
        assert_eq!(host.balance_of(&id(2)), U256::ZERO);
        assert_eq!(host.balance_of(&id(1)), U256::from(10));
        assert!(host.journal().is_empty());
    }
}
