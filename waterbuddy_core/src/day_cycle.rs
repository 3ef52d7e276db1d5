//! Day cycle: committing today's intake and the session state holder.
//!
//! A day moves from accumulating (the ledger receives drinks) to committed
//! (total written to the weekly store, ledger emptied) and straight back
//! to accumulating. Committing is the only way intake becomes durable.

use crate::mood::{classify, Mood};
use crate::weekly::{WeeklyStore, WEEK_DAYS};
use crate::{clamp_goal_override, IntakeEntry, IntakeLedger, Profile, Result, WeeklyRecord};
use chrono::NaiveDate;

/// Save the ledger's total under `today`, then clear the ledger
///
/// The store write happens first. If it fails the error is returned and
/// the ledger keeps its entries, so nothing uncommitted is lost.
/// Committing the same date again overwrites the earlier total.
pub fn commit_day<S: WeeklyStore + ?Sized>(
    ledger: &mut IntakeLedger,
    store: &mut S,
    today: NaiveDate,
) -> Result<u64> {
    let total = ledger.current_total();

    if let Err(e) = store.upsert(today, total) {
        tracing::error!("Failed to commit {} ml for {}: {}", total, today, e);
        return Err(e);
    }

    ledger.clear();
    tracing::info!("Committed {} ml for {}", total, today);
    Ok(total)
}

/// A mutation requested by a front-end
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Log a drink of this many ml
    Log(i64),
    /// Replace the computed goal; clamped to the minimum override
    SetGoal(i64),
    /// Go back to the computed goal
    ClearGoal,
    /// Commit the ledger under this date
    CommitDay(NaiveDate),
    /// Clear the weekly history
    ResetWeek,
}

/// What applying a [`Command`] did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The amount was accepted; carries the new total
    Logged { total_ml: u64 },
    /// The amount was invalid and ignored
    Rejected,
    GoalChanged { goal_ml: u32 },
    Committed { date: NaiveDate, total_ml: u64 },
    WeekReset,
}

/// Owns one user's session: profile, today's ledger and the weekly store
///
/// Front-ends never touch the fields directly; every change goes through
/// the methods below or [`Tracker::apply`].
pub struct Tracker<S: WeeklyStore> {
    profile: Profile,
    ledger: IntakeLedger,
    store: S,
}

impl<S: WeeklyStore> Tracker<S> {
    pub fn new(profile: Profile, store: S) -> Self {
        Self::with_ledger(profile, IntakeLedger::new(), store)
    }

    /// Resume a session with an uncommitted ledger
    pub fn with_ledger(profile: Profile, ledger: IntakeLedger, store: S) -> Self {
        Self {
            profile,
            ledger,
            store,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn ledger(&self) -> &IntakeLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the profile; any goal override is kept unless the new
    /// profile carries its own
    pub fn set_profile(&mut self, profile: Profile) {
        let keep_override = self.profile.goal_override_ml;
        self.profile = profile;
        if self.profile.goal_override_ml.is_none() {
            self.profile.goal_override_ml = keep_override;
        }
        tracing::debug!("Profile updated, goal now {} ml", self.daily_goal());
    }

    pub fn log_amount(&mut self, amount_ml: i64) -> bool {
        self.ledger.log_amount(amount_ml)
    }

    pub fn current_total(&self) -> u64 {
        self.ledger.current_total()
    }

    pub fn recent_history(&self, n: usize) -> Vec<IntakeEntry> {
        self.ledger.recent_history(n)
    }

    pub fn daily_goal(&self) -> u32 {
        self.profile.daily_goal()
    }

    pub fn mood(&self) -> Mood {
        classify(self.current_total(), self.daily_goal() as i64)
    }

    /// Set a manual goal, clamped to at least 500 ml; returns the stored value
    pub fn set_goal_override(&mut self, goal_ml: i64) -> u32 {
        let goal = clamp_goal_override(goal_ml);
        if goal as i64 != goal_ml {
            tracing::warn!("Goal {} ml is below the minimum, using {} ml", goal_ml, goal);
        }
        self.profile.goal_override_ml = Some(goal);
        goal
    }

    pub fn clear_goal_override(&mut self) -> u32 {
        self.profile.goal_override_ml = None;
        self.daily_goal()
    }

    pub fn commit_day(&mut self, today: NaiveDate) -> Result<u64> {
        commit_day(&mut self.ledger, &mut self.store, today)
    }

    pub fn reset_week(&mut self) -> Result<()> {
        self.store.reset_all()
    }

    /// The last seven committed days, oldest first
    pub fn weekly(&self) -> Result<Vec<WeeklyRecord>> {
        self.store.read_recent(WEEK_DAYS)
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::Log(amount) => {
                if self.log_amount(amount) {
                    Outcome::Logged {
                        total_ml: self.current_total(),
                    }
                } else {
                    Outcome::Rejected
                }
            }
            Command::SetGoal(goal) => Outcome::GoalChanged {
                goal_ml: self.set_goal_override(goal),
            },
            Command::ClearGoal => Outcome::GoalChanged {
                goal_ml: self.clear_goal_override(),
            },
            Command::CommitDay(date) => Outcome::Committed {
                date,
                total_ml: self.commit_day(date)?,
            },
            Command::ResetWeek => {
                self.reset_week()?;
                Outcome::WeekReset
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodTier;
    use crate::weekly::{CsvWeeklyStore, MemoryWeeklyStore};
    use crate::Error;

    /// Store whose every operation fails, as if the disk went away
    struct BrokenStore;

    impl WeeklyStore for BrokenStore {
        fn upsert(&mut self, _date: NaiveDate, _total_ml: u64) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn read_recent(&self, _max_days: usize) -> Result<Vec<WeeklyRecord>> {
            Err(Error::Other("unavailable".into()))
        }

        fn reset_all(&mut self) -> Result<()> {
            Err(Error::Other("unavailable".into()))
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_commit_then_read_round_trip() {
        let mut ledger = IntakeLedger::new();
        ledger.log_amount(600);
        ledger.log_amount(900);
        let before = ledger.current_total();

        let mut store = MemoryWeeklyStore::new();
        let committed = commit_day(&mut ledger, &mut store, date(10)).unwrap();
        assert_eq!(committed, before);

        let last = store.read_recent(1).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].total_ml, before);
        assert_eq!(last[0].date, date(10));

        assert_eq!(ledger.current_total(), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_failed_commit_keeps_ledger() {
        let mut ledger = IntakeLedger::new();
        ledger.log_amount(750);

        let result = commit_day(&mut ledger, &mut BrokenStore, date(10));
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(ledger.current_total(), 750);
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_double_commit_overwrites() {
        let mut tracker = Tracker::new(Profile::default(), MemoryWeeklyStore::new());
        tracker.log_amount(1200);
        tracker.commit_day(date(3)).unwrap();
        // Second commit with an empty ledger replaces the total with 0
        tracker.commit_day(date(3)).unwrap();

        let week = tracker.weekly().unwrap();
        assert_eq!(week, vec![WeeklyRecord { date: date(3), total_ml: 0 }]);
    }

    #[test]
    fn test_tracker_scenario() {
        let mut tracker = Tracker::new(Profile::default(), MemoryWeeklyStore::new());
        assert_eq!(tracker.daily_goal(), 2000);

        tracker.log_amount(600);
        tracker.log_amount(900);
        assert_eq!(tracker.current_total(), 1500);
        assert_eq!(tracker.mood().tier, MoodTier::Cheer);

        tracker.log_amount(500);
        assert_eq!(tracker.mood().tier, MoodTier::Celebrate);
        assert_eq!(tracker.recent_history(1)[0].amount_ml, 500);
    }

    #[test]
    fn test_goal_override_is_clamped() {
        let mut tracker = Tracker::new(Profile::default(), MemoryWeeklyStore::new());
        assert_eq!(tracker.set_goal_override(300), 500);
        assert_eq!(tracker.daily_goal(), 500);
        assert_eq!(tracker.set_goal_override(2600), 2600);
        assert_eq!(tracker.clear_goal_override(), 2000);
    }

    #[test]
    fn test_set_profile_keeps_override() {
        let mut tracker = Tracker::new(Profile::default(), MemoryWeeklyStore::new());
        tracker.set_goal_override(2500);
        tracker.set_profile(Profile {
            weight_value: 90.0,
            ..Profile::default()
        });
        assert_eq!(tracker.daily_goal(), 2500);
        tracker.clear_goal_override();
        assert_eq!(tracker.daily_goal(), 2200);
    }

    #[test]
    fn test_apply_commands() {
        let mut tracker = Tracker::new(Profile::default(), MemoryWeeklyStore::new());

        assert_eq!(
            tracker.apply(Command::Log(250)).unwrap(),
            Outcome::Logged { total_ml: 250 }
        );
        assert_eq!(tracker.apply(Command::Log(0)).unwrap(), Outcome::Rejected);
        assert_eq!(
            tracker.apply(Command::SetGoal(100)).unwrap(),
            Outcome::GoalChanged { goal_ml: 500 }
        );
        assert_eq!(
            tracker.apply(Command::ClearGoal).unwrap(),
            Outcome::GoalChanged { goal_ml: 2000 }
        );
        assert_eq!(
            tracker.apply(Command::CommitDay(date(7))).unwrap(),
            Outcome::Committed {
                date: date(7),
                total_ml: 250
            }
        );
        assert_eq!(tracker.current_total(), 0);
        assert_eq!(tracker.weekly().unwrap().len(), 1);

        assert_eq!(tracker.apply(Command::ResetWeek).unwrap(), Outcome::WeekReset);
        assert!(tracker.weekly().unwrap().is_empty());
    }

    #[test]
    fn test_apply_commit_failure_is_surfaced() {
        let mut tracker = Tracker::new(Profile::default(), BrokenStore);
        tracker.apply(Command::Log(400)).unwrap();

        assert!(tracker.apply(Command::CommitDay(date(1))).is_err());
        assert_eq!(tracker.current_total(), 400);
        assert!(tracker.apply(Command::ResetWeek).is_err());
    }

    #[test]
    fn test_commit_to_csv_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CsvWeeklyStore::new(temp_dir.path().join("weekly_data.csv"));
        let mut tracker = Tracker::new(Profile::default(), store);

        for d in 1..=9 {
            tracker.log_amount(d as i64 * 100);
            tracker.commit_day(date(d)).unwrap();
        }

        let week = tracker.weekly().unwrap();
        assert_eq!(week.len(), WEEK_DAYS);
        assert_eq!(week.first().unwrap().date, date(3));
        assert_eq!(week.last().unwrap().total_ml, 900);

        tracker.reset_week().unwrap();
        assert!(tracker.weekly().unwrap().is_empty());
    }
}
