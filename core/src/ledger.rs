//! Resource bookkeeping shared by the player economy and the opponent.

use std::time::Duration;

/// Balance of the extractable resource plus the rate it accrues at.
///
/// Every spend goes through [`ResourceLedger::try_debit`], so the balance can
/// never become negative.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceLedger {
    balance: u32,
    accrual_rate: f64,
    base_rate: f64,
    bonus_per_cell: f64,
}

impl ResourceLedger {
    /// Creates a ledger holding `balance` that accrues `base_rate` per second
    /// plus `bonus_per_cell` per owned cell once the rate is recomputed.
    #[must_use]
    pub const fn new(balance: u32, base_rate: f64, bonus_per_cell: f64) -> Self {
        Self {
            balance,
            accrual_rate: base_rate,
            base_rate,
            bonus_per_cell,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Resource units gained per second.
    #[must_use]
    pub const fn accrual_rate(&self) -> f64 {
        self.accrual_rate
    }

    /// Adds `amount` to the balance, saturating at `u32::MAX`.
    pub fn credit(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Subtracts `amount` when the balance covers it.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    #[must_use]
    pub fn try_debit(&mut self, amount: u32) -> bool {
        match self.balance.checked_sub(amount) {
            Some(remaining) => {
                self.balance = remaining;
                true
            }
            None => false,
        }
    }

    /// Derives the accrual rate from the number of cells the owner holds.
    pub fn recompute_accrual_rate(&mut self, owned_cells: usize) {
        self.accrual_rate = self.base_rate + owned_cells as f64 * self.bonus_per_cell;
    }

    /// Credits `floor(rate * dt)` and returns the whole units gained.
    ///
    /// The fractional remainder is dropped rather than carried into the next
    /// tick.
    pub fn accrue(&mut self, dt: Duration) -> u32 {
        let gained = self.accrual_rate * dt.as_secs_f64();
        if !gained.is_finite() || gained <= 0.0 {
            return 0;
        }
        let whole = gained.floor() as u32;
        self.credit(whole);
        whole
    }
}
