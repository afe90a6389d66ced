//! Per-interval tier grouping and the floor-queryable asteroid index.
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::LOG_TARGET_BUILD;
use crate::interval::{CanonicalInterval, IntervalSpan, sweep};
use crate::recipe::{Recipe, RecipeError, RecipeId, TierKey, validate_all};

/// Recipes sharing one `(interval, tier)` pair with their precomputed sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAggregate<P> {
    tier: TierKey,
    members: Vec<Arc<Recipe<P>>>,
    total_weight: u64,
    total_weighted_duration: u64,
}

impl<P> TierAggregate<P> {
    fn from_members(tier: TierKey, members: Vec<Arc<Recipe<P>>>) -> Self {
        let total_weight = members
            .iter()
            .map(|recipe| u64::from(recipe.weight))
            .sum();
        let total_weighted_duration = members
            .iter()
            .map(|recipe| recipe.weighted_duration())
            .sum();
        Self {
            tier,
            members,
            total_weight,
            total_weighted_duration,
        }
    }

    #[must_use]
    pub const fn tier(&self) -> TierKey {
        self.tier
    }

    /// Member recipes in ascending input order.
    #[must_use]
    pub fn members(&self) -> &[Arc<Recipe<P>>] {
        &self.members
    }

    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// `Σ weight · duration` over the members.
    #[must_use]
    pub const fn total_weighted_duration(&self) -> u64 {
        self.total_weighted_duration
    }
}

/// Tier-indexed aggregates of one canonical interval. Absent tiers are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalEntry<P> {
    end: i64,
    tiers: Vec<Option<TierAggregate<P>>>,
}

impl<P> IntervalEntry<P> {
    /// Exclusive end of the interval.
    #[must_use]
    pub const fn end(&self) -> i64 {
        self.end
    }

    /// Slots indexed by tier key, sized to the highest tier present plus one.
    #[must_use]
    pub fn tiers(&self) -> &[Option<TierAggregate<P>>] {
        &self.tiers
    }

    /// Aggregates that are present, in increasing tier order.
    pub fn aggregates(&self) -> impl Iterator<Item = &TierAggregate<P>> {
        self.tiers.iter().flatten()
    }
}

/// Immutable index from interval start to per-tier aggregates.
///
/// Built once from a recipe snapshot; replacing it means building a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsteroidIndex<P> {
    intervals: BTreeMap<i64, IntervalEntry<P>>,
    recipe_count: usize,
}

impl<P> Default for AsteroidIndex<P> {
    fn default() -> Self {
        Self {
            intervals: BTreeMap::new(),
            recipe_count: 0,
        }
    }
}

impl<P> AsteroidIndex<P> {
    /// Validate `recipes` and build the index over them.
    ///
    /// # Errors
    ///
    /// Returns the first recipe that fails validation; nothing is built.
    pub fn build(recipes: Vec<Recipe<P>>) -> Result<Self, RecipeError> {
        validate_all(&recipes)?;
        let spans = sweep(&recipes);
        let shared: Vec<Arc<Recipe<P>>> = recipes.into_iter().map(Arc::new).collect();

        let mut intervals = BTreeMap::new();
        for span in spans {
            let IntervalSpan { interval, active } = span;
            let entry = group_by_tier(interval, &active, &shared);
            let previous = intervals.insert(interval.start, entry);
            assert!(
                previous.is_none(),
                "interval builder emitted start {} twice",
                interval.start
            );
        }

        let index = Self {
            intervals,
            recipe_count: shared.len(),
        };
        debug!(
            target: LOG_TARGET_BUILD,
            "built asteroid index: {} recipes, {} intervals, {} aggregates",
            index.recipe_count,
            index.interval_count(),
            index.aggregate_count()
        );
        Ok(index)
    }

    /// Number of recipes in the snapshot this index was built from.
    #[must_use]
    pub const fn recipe_count(&self) -> usize {
        self.recipe_count
    }

    #[must_use]
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn aggregate_count(&self) -> usize {
        self.intervals
            .values()
            .map(|entry| entry.aggregates().count())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Interval covering `distance`, found by predecessor lookup on the starts.
    ///
    /// A floor hit that ends at or before `distance` sits in a gap and is not returned.
    #[must_use]
    pub fn interval_at(&self, distance: i64) -> Option<(CanonicalInterval, &IntervalEntry<P>)> {
        let (&start, entry) = self.intervals.range(..=distance).next_back()?;
        (distance < entry.end).then(|| (CanonicalInterval::new(start, entry.end), entry))
    }

    /// All intervals in increasing distance order.
    pub fn intervals(&self) -> impl Iterator<Item = (CanonicalInterval, &IntervalEntry<P>)> {
        self.intervals
            .iter()
            .map(|(&start, entry)| (CanonicalInterval::new(start, entry.end), entry))
    }
}

fn group_by_tier<P>(
    interval: CanonicalInterval,
    active: &[RecipeId],
    recipes: &[Arc<Recipe<P>>],
) -> IntervalEntry<P> {
    let mut groups: BTreeMap<TierKey, Vec<Arc<Recipe<P>>>> = BTreeMap::new();
    for id in active {
        let recipe = &recipes[id.0];
        groups
            .entry(recipe.tier)
            .or_default()
            .push(Arc::clone(recipe));
    }

    let width = groups
        .keys()
        .next_back()
        .map_or(0, |&tier| usize::from(tier) + 1);
    let mut tiers: Vec<Option<TierAggregate<P>>> = Vec::with_capacity(width);
    tiers.resize_with(width, || None);

    for (tier, members) in groups {
        let slot = &mut tiers[usize::from(tier)];
        assert!(
            slot.is_none(),
            "duplicate aggregate for tier {tier} in interval [{}, {})",
            interval.start,
            interval.end
        );
        *slot = Some(TierAggregate::from_members(tier, members));
    }

    IntervalEntry {
        end: interval.end,
        tiers,
    }
}
