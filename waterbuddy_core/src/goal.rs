//! Daily goal calculation.
//!
//! The goal starts from a base amount per age group and is adjusted by
//! 10 ml for every kilogram of body weight above or below 70 kg.

use crate::{AgeGroup, Profile, WeightUnit};

/// Weight assumed when the user's input cannot be used
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.453592;

/// Computed goals never go below this
pub const MIN_COMPUTED_GOAL_ML: u32 = 1000;

/// Manual overrides never go below this
pub const MIN_GOAL_OVERRIDE_ML: u32 = 500;

/// Base daily goal for an age group, before the weight adjustment
pub fn base_goal(age_group: AgeGroup) -> u32 {
    match age_group {
        AgeGroup::Child => 1200,
        AgeGroup::Teen => 1700,
        AgeGroup::Adult => 2000,
        AgeGroup::Senior => 1700,
    }
}

/// Convert a weight to kilograms
///
/// Non-finite weights are replaced by [`DEFAULT_WEIGHT_KG`].
pub fn weight_in_kg(weight_value: f64, weight_unit: WeightUnit) -> f64 {
    if !weight_value.is_finite() {
        return DEFAULT_WEIGHT_KG;
    }
    match weight_unit {
        WeightUnit::Kg => weight_value,
        WeightUnit::Lb => weight_value * KG_PER_LB,
    }
}

/// Parse a weight typed by the user, falling back to 70 on bad input.
pub fn parse_weight(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(w) if w.is_finite() => w,
        _ => {
            tracing::debug!("Invalid weight {:?}, using {}", input, DEFAULT_WEIGHT_KG);
            DEFAULT_WEIGHT_KG
        }
    }
}

/// Compute the daily goal in milliliters
///
/// `goal = max(1000, base + round((weight_kg - 70) * 10))`
pub fn compute_goal(age_group: AgeGroup, weight_value: f64, weight_unit: WeightUnit) -> u32 {
    let weight_kg = weight_in_kg(weight_value, weight_unit);
    let tweak = ((weight_kg - DEFAULT_WEIGHT_KG) * 10.0).round();
    let goal = base_goal(age_group) as f64 + tweak;

    // f64 -> u32 casts saturate, so huge weights cannot wrap
    let goal = goal.max(MIN_COMPUTED_GOAL_ML as f64) as u32;
    tracing::debug!(
        "Computed goal {} ml for {:?} at {:.1} kg",
        goal,
        age_group,
        weight_kg
    );
    goal
}

/// Clamp an externally supplied goal to the allowed minimum
pub fn clamp_goal_override(goal_ml: i64) -> u32 {
    goal_ml.clamp(MIN_GOAL_OVERRIDE_ML as i64, u32::MAX as i64) as u32
}

impl Profile {
    /// Goal computed from age group and weight, ignoring any override
    pub fn computed_goal(&self) -> u32 {
        compute_goal(self.age_group, self.weight_value, self.weight_unit)
    }

    /// The goal in effect: the override when set, else the computed goal
    pub fn daily_goal(&self) -> u32 {
        match self.goal_override_ml {
            Some(ml) => clamp_goal_override(ml as i64),
            None => self.computed_goal(),
        }
    }
}
