//! Recipe records consumed by the asteroid index.
//!
//! The index only reads the distance range, tier key, weight and duration of a
//! recipe. Everything else travels along as an opaque payload.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::TIER_MASK_WIDTH;

/// Discrete equipment tier used as the secondary index dimension.
pub type TierKey = u8;

/// Position of a recipe in the snapshot an index was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub usize);

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A weighted recipe valid over the inclusive distance range `[min_distance, max_distance]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe<P> {
    pub min_distance: i32,
    pub max_distance: i32,
    pub tier: TierKey,
    pub weight: u32,
    pub duration: u32,
    pub payload: P,
}

impl<P> Recipe<P> {
    #[must_use]
    pub const fn new(
        min_distance: i32,
        max_distance: i32,
        tier: TierKey,
        weight: u32,
        duration: u32,
        payload: P,
    ) -> Self {
        Self {
            min_distance,
            max_distance,
            tier,
            weight,
            duration,
            payload,
        }
    }

    /// Whether `distance` lies inside the declared inclusive range.
    #[must_use]
    pub const fn contains(&self, distance: i32) -> bool {
        self.min_distance <= distance && distance <= self.max_distance
    }

    /// `weight * duration`, the recipe's contribution to an aggregate's time density.
    #[must_use]
    pub fn weighted_duration(&self) -> u64 {
        u64::from(self.weight) * u64::from(self.duration)
    }

    /// Sweep position of the start event.
    pub(crate) fn start_position(&self) -> i64 {
        i64::from(self.min_distance)
    }

    /// Sweep position of the end event, one past the inclusive maximum.
    pub(crate) fn end_position(&self) -> i64 {
        i64::from(self.max_distance) + 1
    }

    /// Check the record against the build-time rules.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, tagged with `id`.
    pub fn validate(&self, id: RecipeId) -> Result<(), RecipeError> {
        if self.max_distance < self.min_distance {
            return Err(RecipeError::InvertedRange {
                id,
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        if self.weight == 0 {
            return Err(RecipeError::ZeroWeight { id });
        }
        if self.duration == 0 {
            return Err(RecipeError::ZeroDuration { id });
        }
        if self.tier >= TIER_MASK_WIDTH {
            return Err(RecipeError::TierOutOfRange {
                id,
                tier: self.tier,
                width: TIER_MASK_WIDTH,
            });
        }
        Ok(())
    }
}

/// Validate every recipe of a snapshot, stopping at the first offender.
///
/// # Errors
///
/// Returns the error for the lowest-numbered invalid recipe.
pub fn validate_all<P>(recipes: &[Recipe<P>]) -> Result<(), RecipeError> {
    recipes
        .iter()
        .enumerate()
        .try_for_each(|(idx, recipe)| recipe.validate(RecipeId(idx)))
}

/// Build-time validation failures. Each names the offending recipe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("recipe {id}: max distance {max} is below min distance {min}")]
    InvertedRange { id: RecipeId, min: i32, max: i32 },
    #[error("recipe {id}: weight must be positive")]
    ZeroWeight { id: RecipeId },
    #[error("recipe {id}: duration must be positive")]
    ZeroDuration { id: RecipeId },
    #[error("recipe {id}: tier {tier} does not fit a {width}-bit tier mask")]
    TierOutOfRange { id: RecipeId, tier: TierKey, width: u8 },
}

impl RecipeError {
    /// The recipe that failed validation.
    #[must_use]
    pub const fn recipe(&self) -> RecipeId {
        match self {
            Self::InvertedRange { id, .. }
            | Self::ZeroWeight { id }
            | Self::ZeroDuration { id }
            | Self::TierOutOfRange { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(min: i32, max: i32, weight: u32, duration: u32) -> Recipe<()> {
        Recipe::new(min, max, 0, weight, duration, ())
    }

    #[test]
    fn single_point_range_is_valid() {
        let point = recipe(5, 5, 1, 1);
        assert!(point.validate(RecipeId(0)).is_ok());
        assert!(point.contains(5));
        assert!(!point.contains(4));
        assert!(!point.contains(6));
        assert_eq!(point.end_position() - point.start_position(), 1);
    }

    #[test]
    fn validation_names_the_offender() {
        let recipes = vec![recipe(0, 10, 1, 1), recipe(3, 2, 1, 1), recipe(0, 1, 0, 1)];
        let err = validate_all(&recipes).unwrap_err();
        assert_eq!(
            err,
            RecipeError::InvertedRange {
                id: RecipeId(1),
                min: 3,
                max: 2
            }
        );
        assert_eq!(err.recipe(), RecipeId(1));
        assert!(err.to_string().contains("recipe #1"));
    }

    #[test]
    fn zero_weight_and_duration_rejected() {
        assert_eq!(
            recipe(0, 1, 0, 5).validate(RecipeId(7)),
            Err(RecipeError::ZeroWeight { id: RecipeId(7) })
        );
        assert_eq!(
            recipe(0, 1, 5, 0).validate(RecipeId(8)),
            Err(RecipeError::ZeroDuration { id: RecipeId(8) })
        );
    }

    #[test]
    fn tier_beyond_mask_rejected() {
        let wide = Recipe::new(0, 1, TIER_MASK_WIDTH, 1, 1, ());
        assert!(matches!(
            wide.validate(RecipeId(0)),
            Err(RecipeError::TierOutOfRange { tier: 32, .. })
        ));
    }

    #[test]
    fn end_position_does_not_overflow() {
        let edge = recipe(i32::MAX, i32::MAX, 1, 1);
        assert_eq!(edge.end_position(), i64::from(i32::MAX) + 1);
        assert_eq!(edge.weighted_duration(), 1);
    }
}
