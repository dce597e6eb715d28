//! Daily spending cap with coarse day buckets.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// Length of one day bucket.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Day bucket containing `timestamp`.
#[must_use]
pub const fn day_bucket(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// A charge accepted by [`SpendingLimit::charge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingCharge {
    /// Charged value.
    pub amount: U256,
    /// Total spent in the bucket after the charge.
    pub spent_today: U256,
    /// Bucket the charge landed in.
    pub day: u64,
}

/// Spending cap state. A `daily_limit` of zero disables enforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimit {
    daily_limit: U256,
    spent_today: U256,
    last_reset_day: u64,
}

impl SpendingLimit {
    /// Configured cap.
    #[must_use]
    pub const fn daily_limit(&self) -> U256 {
        self.daily_limit
    }

    /// Value spent in the last observed bucket.
    #[must_use]
    pub const fn spent_today(&self) -> U256 {
        self.spent_today
    }

    /// Last observed bucket.
    #[must_use]
    pub const fn last_reset_day(&self) -> u64 {
        self.last_reset_day
    }

    /// Replaces the cap. Spending already recorded for the bucket is kept, clamped to
    /// a non-zero `limit`, so a lowered cap allows no further spending that day.
    pub fn set_daily_limit(&mut self, limit: U256) {
        self.daily_limit = limit;
        if !limit.is_zero() && self.spent_today > limit {
            self.spent_today = limit;
        }
    }

    /// Value that can still be spent at `timestamp`.
    #[must_use]
    pub fn remaining(&self, timestamp: u64) -> Option<U256> {
        if self.daily_limit.is_zero() {
            return None;
        }
        let spent = if day_bucket(timestamp) == self.last_reset_day {
            self.spent_today
        } else {
            U256::ZERO
        };
        Some(self.daily_limit.saturating_sub(spent))
    }

    /// Rolls the bucket over if `timestamp` lies in a new day, then charges `amount`.
    ///
    /// Returns `None` when no cap is configured.
    ///
    /// # Errors
    /// `LimitExceeded` if the charge would push spending past the cap. The bucket
    /// rollover is kept even then, matching what a later successful charge would see.
    pub fn charge(
        &mut self,
        amount: U256,
        timestamp: u64,
    ) -> AccountResult<Option<SpendingCharge>> {
        let day = day_bucket(timestamp);
        if day != self.last_reset_day {
            self.spent_today = U256::ZERO;
            self.last_reset_day = day;
        }
        let Some(remaining) = self.remaining(timestamp) else {
            return Ok(None);
        };
        if amount > remaining {
            return Err(AccountError::LimitExceeded {
                requested: amount,
                remaining,
            });
        }
        self.spent_today += amount;
        Ok(Some(SpendingCharge {
            amount,
            spent_today: self.spent_today,
            day,
        }))
    }
}
