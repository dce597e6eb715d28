//! Guardian voting state for social recovery.
//!
//! A round is `Idle` until the first vote fixes the proposed successor, stays
//! `Proposed` while votes accumulate, and resets to `Idle` when the threshold is
//! reached or the owner cancels it.

use std::collections::HashSet;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// Observable phase of a recovery round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    /// No successor proposed.
    Idle,
    /// Votes are outstanding for `new_owner`.
    Proposed {
        /// Successor being voted on.
        new_owner: Address,
        /// Votes cast so far.
        votes: usize,
    },
}

/// Outcome of casting one vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was recorded; the threshold is not reached yet.
    Pending {
        /// Running tally.
        votes: usize,
    },
    /// The vote reached the threshold. The round has already been reset.
    Completed {
        /// Tally at completion.
        votes: usize,
        /// Successor to install.
        new_owner: Address,
    },
}

/// Voting state of the current round.
///
/// Votes are keyed by guardian identity and survive the guardian's later removal from
/// the set; only completion or cancellation clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRound {
    proposed: Option<Address>,
    voted: HashSet<Address>,
}

impl RecoveryRound {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RecoveryPhase {
        match self.proposed {
            Some(new_owner) => RecoveryPhase::Proposed {
                new_owner,
                votes: self.voted.len(),
            },
            None => RecoveryPhase::Idle,
        }
    }

    /// Successor of the active round, if any.
    #[must_use]
    pub const fn proposed(&self) -> Option<Address> {
        self.proposed
    }

    /// Votes cast in the active round.
    #[must_use]
    pub fn votes(&self) -> usize {
        self.voted.len()
    }

    /// Returns `true` if `guardian` voted in the active round.
    #[must_use]
    pub fn has_voted(&self, guardian: &Address) -> bool {
        self.voted.contains(guardian)
    }

    /// Records `guardian`'s vote for `new_owner` and resolves the round once `threshold`
    /// votes are in.
    ///
    /// The caller is responsible for checking guardian membership.
    ///
    /// # Errors
    /// - `InvalidArgument` if `new_owner` is the zero address.
    /// - `DuplicateVote` if `guardian` already voted in this round.
    /// - `ProposalConflict` if a different successor is in flight.
    pub fn vote(
        &mut self,
        guardian: Address,
        new_owner: Address,
        threshold: usize,
    ) -> AccountResult<VoteOutcome> {
        if new_owner.is_zero() {
            return Err(AccountError::invalid("new_owner", "zero address"));
        }
        if self.voted.contains(&guardian) {
            return Err(AccountError::DuplicateVote { guardian });
        }
        if self.voted.is_empty() {
            self.proposed = Some(new_owner);
        } else if let Some(proposed) = self.proposed.filter(|p| *p != new_owner) {
            return Err(AccountError::ProposalConflict {
                proposed,
                requested: new_owner,
            });
        }

        self.voted.insert(guardian);
        let votes = self.voted.len();
        if votes >= threshold {
            self.reset();
            return Ok(VoteOutcome::Completed { votes, new_owner });
        }
        Ok(VoteOutcome::Pending { votes })
    }

    /// Clears the proposal and every vote flag. Returns the abandoned successor.
    pub fn reset(&mut self) -> Option<Address> {
        self.voted.clear();
        self.proposed.take()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn id(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_first_vote_fixes_successor() {
        let mut round = RecoveryRound::default();
        assert_eq!(round.phase(), RecoveryPhase::Idle);

        let outcome = round.vote(id(1), id(9), 2).unwrap();
        assert_eq!(outcome, VoteOutcome::Pending { votes: 1 });
        assert_eq!(
            round.phase(),
            RecoveryPhase::Proposed {
                new_owner: id(9),
                votes: 1
            }
        );
    }

    #[test]
    fn test_conflicting_successor_is_rejected() {
        let mut round = RecoveryRound::default();
        round.vote(id(1), id(9), 3).unwrap();

        let err = round.vote(id(2), id(8), 3).unwrap_err();
        assert_eq!(
            err,
            AccountError::ProposalConflict {
                proposed: id(9),
                requested: id(8)
            }
        );
        assert_eq!(round.votes(), 1);
        assert!(!round.has_voted(&id(2)));
    }

    #[test]
    fn test_duplicate_vote_is_rejected() {
        let mut round = RecoveryRound::default();
        round.vote(id(1), id(9), 3).unwrap();
        assert_eq!(
            round.vote(id(1), id(9), 3).unwrap_err(),
            AccountError::DuplicateVote { guardian: id(1) }
        );
    }

    #[test]
    fn test_zero_successor_is_rejected() {
        let mut round = RecoveryRound::default();
        assert!(matches!(
            round.vote(id(1), Address::ZERO, 1),
            Err(AccountError::InvalidArgument { .. })
        ));
        assert_eq!(round.phase(), RecoveryPhase::Idle);
    }

    #[test_case(&[1, 2, 3] ; "in order")]
    #[test_case(&[3, 1, 2] ; "rotated")]
    #[test_case(&[2, 3, 1] ; "shuffled")]
    fn test_completion_is_order_independent(order: &[u8]) {
        let mut round = RecoveryRound::default();
        let mut outcomes = order
            .iter()
            .map(|g| round.vote(id(*g), id(9), 3).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(
            outcomes.pop(),
            Some(VoteOutcome::Completed {
                votes: 3,
                new_owner: id(9)
            })
        );
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, VoteOutcome::Pending { .. })));
        assert_eq!(round.phase(), RecoveryPhase::Idle);
        assert!(order.iter().all(|g| !round.has_voted(&id(*g))));
    }

    #[test]
    fn test_reset_returns_abandoned_successor() {
        let mut round = RecoveryRound::default();
        round.vote(id(1), id(9), 2).unwrap();
        assert_eq!(round.reset(), Some(id(9)));
        assert_eq!(round.votes(), 0);
        assert_eq!(round.reset(), None);
    }
}
