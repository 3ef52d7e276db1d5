//! Session state persistence with file locking.
//!
//! Front-ends that run one process per action (like the CLI) keep the
//! profile and the uncommitted ledger here between runs. Writing this file
//! is not a commit: intake only reaches the weekly history through
//! [`crate::day_cycle::commit_day`].

use crate::weekly::WeeklyStore;
use crate::{Error, IntakeLedger, Profile, Result, Tracker};
use chrono::{Local, NaiveDate};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Profile plus the open ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub ledger: IntakeLedger,
    /// Local date the open ledger was started on
    #[serde(default = "today")]
    pub started_on: NaiveDate,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            ledger: IntakeLedger::default(),
            started_on: today(),
        }
    }
}

impl SessionState {
    /// Load session state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No session file found, starting a new session");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open session file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock session file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read session file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<SessionState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded session from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse session file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save session state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "session path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session to {:?}", path);
        Ok(())
    }

    /// True when the open ledger holds intake from an earlier day
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        !self.ledger.is_empty() && self.started_on < today
    }

    /// Hand the session to a [`Tracker`] backed by `store`
    pub fn into_tracker<S: WeeklyStore>(self, store: S) -> Tracker<S> {
        Tracker::with_ledger(self.profile, self.ledger, store)
    }

    /// Snapshot a tracker's session
    ///
    /// An empty ledger restarts the day counter at `today`; a ledger that
    /// still holds intake keeps its original start date.
    pub fn from_tracker<S: WeeklyStore>(
        tracker: &Tracker<S>,
        started_on: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        let started_on = if tracker.ledger().is_empty() {
            today
        } else {
            started_on
        };
        Self {
            profile: tracker.profile().clone(),
            ledger: tracker.ledger().clone(),
            started_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weekly::MemoryWeeklyStore;
    use crate::AgeGroup;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let mut state = SessionState::default();
        state.profile.name = Some("Sam".into());
        state.profile.age_group = AgeGroup::Teen;
        state.ledger.log_amount(250);
        state.ledger.log_amount(100);

        state.save(&state_path).unwrap();
        let loaded = SessionState::load(&state_path).unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.ledger.current_total(), 350);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = SessionState::load(&temp_dir.path().join("nonexistent.json")).unwrap();
        assert_eq!(state.profile, Profile::default());
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn test_corrupted_state_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("corrupted.json");
        std::fs::write(&state_path, "{ invalid json }").unwrap();

        let state = SessionState::load(&state_path).unwrap();
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        SessionState::default().save(&state_path).unwrap();

        assert!(state_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only state.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_staleness() {
        let mut state = SessionState {
            started_on: date(1),
            ..SessionState::default()
        };
        assert!(!state.is_stale(date(2)));

        state.ledger.log_amount(200);
        assert!(state.is_stale(date(2)));
        assert!(!state.is_stale(date(1)));
    }

    #[test]
    fn test_tracker_round_trip() {
        let mut state = SessionState {
            started_on: date(1),
            ..SessionState::default()
        };
        state.ledger.log_amount(500);

        let mut tracker = state.into_tracker(MemoryWeeklyStore::new());
        assert_eq!(tracker.current_total(), 500);

        let snapshot = SessionState::from_tracker(&tracker, date(1), date(2));
        assert_eq!(snapshot.started_on, date(1));

        tracker.commit_day(date(2)).unwrap();
        let snapshot = SessionState::from_tracker(&tracker, date(1), date(2));
        assert_eq!(snapshot.started_on, date(2));
        assert!(snapshot.ledger.is_empty());
    }
}
