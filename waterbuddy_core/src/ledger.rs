//! In-memory ledger of today's intake.
//!
//! The ledger only accumulates. Capping progress at the goal is the mood
//! classifier's job; the total here may exceed the goal.

use crate::IntakeEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Today's logged drinks and their running total
///
/// Invariant: `total_ml` is the sum of `amount_ml` over `history`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "LedgerRepr", into = "LedgerRepr")]
pub struct IntakeLedger {
    total_ml: u64,
    history: Vec<IntakeEntry>,
}

/// On-disk form; the total is recomputed on load so it can never drift
#[derive(Serialize, Deserialize)]
struct LedgerRepr {
    #[serde(default)]
    history: Vec<IntakeEntry>,
}

impl From<LedgerRepr> for IntakeLedger {
    fn from(repr: LedgerRepr) -> Self {
        let total_ml = repr.history.iter().map(|e| e.amount_ml as u64).sum();
        Self {
            total_ml,
            history: repr.history,
        }
    }
}

impl From<IntakeLedger> for LedgerRepr {
    fn from(ledger: IntakeLedger) -> Self {
        Self {
            history: ledger.history,
        }
    }
}

impl IntakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a drink at the current time
    ///
    /// Returns `false` (and changes nothing) for amounts that are not
    /// positive or do not fit in a `u32`.
    pub fn log_amount(&mut self, amount_ml: i64) -> bool {
        self.log_amount_at(Utc::now(), amount_ml)
    }

    /// Log a drink with an explicit timestamp
    pub fn log_amount_at(&mut self, at: DateTime<Utc>, amount_ml: i64) -> bool {
        let amount = match u32::try_from(amount_ml) {
            Ok(a) if a > 0 => a,
            _ => {
                tracing::debug!("Ignoring intake amount {}", amount_ml);
                return false;
            }
        };

        self.total_ml += amount as u64;
        self.history.push(IntakeEntry {
            at,
            amount_ml: amount,
        });
        tracing::debug!("Logged {} ml, total now {} ml", amount, self.total_ml);
        true
    }

    pub fn current_total(&self) -> u64 {
        self.total_ml
    }

    /// The last `n` entries, most recent first
    pub fn recent_history(&self, n: usize) -> Vec<IntakeEntry> {
        self.history.iter().rev().take(n).cloned().collect()
    }

    /// All entries in the order they were logged
    pub fn history(&self) -> &[IntakeEntry] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Only the day cycle clears the ledger, after a successful commit
    pub(crate) fn clear(&mut self) {
        self.total_ml = 0;
        self.history.clear();
    }
}

/// Parse a manually typed amount
///
/// Decimal input is truncated toward zero (`"250.7"` is 250). Returns `None`
/// for anything that is not a finite number. Sign is not checked here;
/// [`IntakeLedger::log_amount`] rejects non-positive amounts.
pub fn parse_amount(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v.trunc() as i64),
        _ => None,
    }
}
