#![forbid(unsafe_code)]

//! Core domain model and business logic for WaterBuddy.
//!
//! This crate provides:
//! - Domain types (profile, intake entries, weekly records)
//! - Goal calculation
//! - The intake ledger and mood classification
//! - Persistence (weekly CSV history, session state)
//! - The day cycle that commits a day to the weekly history

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod goal;
pub mod ledger;
pub mod mood;
pub mod weekly;
pub mod day_cycle;
pub mod state;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use goal::{clamp_goal_override, compute_goal, parse_weight};
pub use ledger::{parse_amount, IntakeLedger};
pub use mood::{classify, Mood, MoodTier};
pub use weekly::{CsvWeeklyStore, MemoryWeeklyStore, WeeklyStore, WEEK_DAYS};
pub use day_cycle::{commit_day, Command, Outcome, Tracker};
pub use state::SessionState;
