//! Core domain types for WaterBuddy.
//!
//! This module defines the fundamental types used throughout the system:
//! - Age groups and weight units used by the goal calculator
//! - The user profile
//! - Intake log entries
//! - Weekly history records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Profile Types
// ============================================================================

/// Age band used to look up the base daily goal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    /// 4-8 years
    Child,
    /// 9-13 years
    Teen,
    /// 14-64 years
    #[default]
    Adult,
    /// 65+ years
    Senior,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Child,
        AgeGroup::Teen,
        AgeGroup::Adult,
        AgeGroup::Senior,
    ];

    /// Human readable label, including the age range
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Child => "Children (4-8 yrs)",
            AgeGroup::Teen => "Teens (9-13 yrs)",
            AgeGroup::Adult => "Adults (14-64 yrs)",
            AgeGroup::Senior => "Seniors (65+ yrs)",
        }
    }

    /// Parse an age group, falling back to `Adult` for anything unrecognised.
    pub fn parse_lenient(input: &str) -> Self {
        input.parse().unwrap_or_else(|_| {
            tracing::debug!("Unknown age group {:?}, using adult", input);
            AgeGroup::Adult
        })
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeGroup {
    type Err = crate::Error;

    /// Accepts `child`, `teens`, `Adults (14-64 yrs)` and similar spellings.
    fn from_str(s: &str) -> crate::Result<Self> {
        let lower = s.trim().to_lowercase();
        if lower.starts_with("child") {
            Ok(AgeGroup::Child)
        } else if lower.starts_with("teen") {
            Ok(AgeGroup::Teen)
        } else if lower.starts_with("adult") {
            Ok(AgeGroup::Adult)
        } else if lower.starts_with("senior") {
            Ok(AgeGroup::Senior)
        } else {
            Err(crate::Error::Other(format!("Unknown age group: {}", s)))
        }
    }
}

/// Unit the user entered their body weight in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl FromStr for WeightUnit {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lb),
            other => Err(crate::Error::Other(format!("Unknown weight unit: {}", other))),
        }
    }
}

/// The user's profile, as collected at onboarding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    pub age_group: AgeGroup,
    pub weight_value: f64,
    pub weight_unit: WeightUnit,
    /// Manual goal set by the user; replaces the computed goal when present
    #[serde(default)]
    pub goal_override_ml: Option<u32>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: None,
            age_group: AgeGroup::Adult,
            weight_value: crate::goal::DEFAULT_WEIGHT_KG,
            weight_unit: WeightUnit::Kg,
            goal_override_ml: None,
        }
    }
}

// ============================================================================
// Intake Types
// ============================================================================

/// A single logged drink
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntakeEntry {
    pub at: DateTime<Utc>,
    pub amount_ml: u32,
}

// ============================================================================
// Weekly History Types
// ============================================================================

/// One committed day in the weekly history
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyRecord {
    pub date: NaiveDate,
    pub total_ml: u64,
}
