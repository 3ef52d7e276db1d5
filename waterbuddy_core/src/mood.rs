//! Mood derived from progress towards the daily goal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mascot mood, from least to most enthusiastic
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MoodTier {
    Neutral,
    Smile,
    Cheer,
    Celebrate,
}

impl MoodTier {
    /// Tier for a whole-number percentage; first matching threshold wins
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            p if p >= 100 => MoodTier::Celebrate,
            p if p >= 75 => MoodTier::Cheer,
            p if p >= 50 => MoodTier::Smile,
            _ => MoodTier::Neutral,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MoodTier::Celebrate => "You did it! Goal completed! 🎉",
            MoodTier::Cheer => "Amazing! Just a little more to reach your goal!",
            MoodTier::Smile => "Great job! You're halfway there!",
            MoodTier::Neutral => "Let's stay hydrated! Small sips add up",
        }
    }

    /// Text fallback for the mascot picture
    pub fn emoji(self) -> &'static str {
        match self {
            MoodTier::Neutral => "💧",
            MoodTier::Smile => "😊",
            MoodTier::Cheer => "👏",
            MoodTier::Celebrate => "🎉",
        }
    }
}

impl fmt::Display for MoodTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoodTier::Neutral => "neutral",
            MoodTier::Smile => "smile",
            MoodTier::Cheer => "cheer",
            MoodTier::Celebrate => "celebrate",
        };
        f.write_str(name)
    }
}

/// Result of classifying progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mood {
    pub tier: MoodTier,
    pub message: &'static str,
    pub percentage: u8,
}

/// Progress as a whole-number percentage in `0..=100`
///
/// The fractional part is dropped, so 1499 of 2000 is 74, not 75.
/// A goal of zero or less yields 0.
pub fn progress_percentage(total_ml: u64, goal_ml: i64) -> u8 {
    if goal_ml <= 0 {
        return 0;
    }
    let pct = (total_ml as u128 * 100) / goal_ml as u128;
    pct.min(100) as u8
}

/// How much is left to drink; zero once the goal is met
pub fn remaining_ml(total_ml: u64, goal_ml: i64) -> u64 {
    if goal_ml <= 0 {
        return 0;
    }
    (goal_ml as u64).saturating_sub(total_ml)
}

/// Classify progress into a mood tier and message
pub fn classify(total_ml: u64, goal_ml: i64) -> Mood {
    let percentage = progress_percentage(total_ml, goal_ml);
    let tier = MoodTier::from_percentage(percentage);
    Mood {
        tier,
        message: tier.message(),
        percentage,
    }
}
