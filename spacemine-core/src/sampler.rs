//! Weighted recipe draws over the aggregates returned by a query.
use rand::Rng;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::index::{AsteroidIndex, TierAggregate};
use crate::numbers::{ratio, u64_to_f64};
use crate::query::TierMask;
use crate::recipe::Recipe;

/// Walk `weights` in order with `roll` and return the chosen position and the leftover roll.
///
/// An element is chosen when `roll <= weight`; otherwise the weight is subtracted and the
/// walk continues. The final element is never compared: whatever remains of the roll
/// lands on it. This clamp absorbs rolls pushed past the total by floating-point rounding.
///
/// # Panics
///
/// Panics when `weights` is empty.
pub fn pick_index<I>(weights: I, mut roll: f64) -> (usize, f64)
where
    I: IntoIterator<Item = u64>,
    I::IntoIter: ExactSizeIterator,
{
    let weights = weights.into_iter();
    let len = weights.len();
    assert!(len > 0, "cannot pick from an empty weight list");
    let last = len - 1;
    for (idx, weight) in weights.take(last).enumerate() {
        let weight = u64_to_f64(weight);
        if roll <= weight {
            return (idx, roll);
        }
        roll -= weight;
    }
    (last, roll)
}

/// Draw one recipe, weighted by recipe weight, across `aggregates`.
///
/// The draw first picks an aggregate by its total weight and then a member inside it,
/// reusing the leftover roll.
///
/// # Panics
///
/// Panics when `aggregates` is empty or their combined weight is zero.
pub fn sample<'a, P, R>(aggregates: &[&'a TierAggregate<P>], rng: &mut R) -> &'a Arc<Recipe<P>>
where
    R: Rng + ?Sized,
{
    let total: u64 = aggregates.iter().map(|aggregate| aggregate.total_weight()).sum();
    draw(aggregates, total, rng)
}

fn draw<'a, P, R>(aggregates: &[&'a TierAggregate<P>], total: u64, rng: &mut R) -> &'a Arc<Recipe<P>>
where
    R: Rng + ?Sized,
{
    assert!(
        !aggregates.is_empty() && total > 0,
        "sampling requires at least one recipe with positive weight (aggregates: {}, total weight: {total})",
        aggregates.len()
    );
    let roll = rng.r#gen::<f64>() * u64_to_f64(total);
    let (chosen, roll) = pick_index(aggregates.iter().map(|aggregate| aggregate.total_weight()), roll);
    let members = aggregates[chosen].members();
    let (member, _) = pick_index(members.iter().map(|recipe| u64::from(recipe.weight)), roll);
    &members[member]
}

/// Aggregates selected by one query together with their combined sums.
#[derive(Debug)]
pub struct LookupResult<'a, P> {
    aggregates: SmallVec<[&'a TierAggregate<P>; 4]>,
    total_weight: u64,
    total_weighted_duration: u64,
}

impl<P> Clone for LookupResult<'_, P> {
    fn clone(&self) -> Self {
        Self {
            aggregates: self.aggregates.clone(),
            total_weight: self.total_weight,
            total_weighted_duration: self.total_weighted_duration,
        }
    }
}

impl<'a, P> LookupResult<'a, P> {
    pub fn from_aggregates<I>(aggregates: I) -> Self
    where
        I: IntoIterator<Item = &'a TierAggregate<P>>,
    {
        let aggregates: SmallVec<[&'a TierAggregate<P>; 4]> = aggregates.into_iter().collect();
        let total_weight = aggregates.iter().map(|aggregate| aggregate.total_weight()).sum();
        let total_weighted_duration = aggregates
            .iter()
            .map(|aggregate| aggregate.total_weighted_duration())
            .sum();
        Self {
            aggregates,
            total_weight,
            total_weighted_duration,
        }
    }

    #[must_use]
    pub fn aggregates(&self) -> &[&'a TierAggregate<P>] {
        &self.aggregates
    }

    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.total_weight
    }

    #[must_use]
    pub const fn total_weighted_duration(&self) -> u64 {
        self.total_weighted_duration
    }

    /// True when no recipe can be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty() || self.total_weight == 0
    }

    /// Recipes across every selected aggregate, tier by tier.
    pub fn recipes(&self) -> impl Iterator<Item = &'a Arc<Recipe<P>>> + '_ {
        self.aggregates
            .iter()
            .flat_map(|aggregate| aggregate.members().iter())
    }

    /// Weight-averaged duration of one operation, 0.0 when empty.
    #[must_use]
    pub fn expected_duration(&self) -> f64 {
        ratio(self.total_weighted_duration, self.total_weight)
    }

    /// # Panics
    ///
    /// Panics when the lookup selected nothing.
    pub fn sample<R>(&self, rng: &mut R) -> &'a Arc<Recipe<P>>
    where
        R: Rng + ?Sized,
    {
        draw(&self.aggregates, self.total_weight, rng)
    }

    pub fn try_sample<R>(&self, rng: &mut R) -> Option<&'a Arc<Recipe<P>>>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        Some(self.sample(rng))
    }
}

impl<P> AsteroidIndex<P> {
    /// Query and collect the result in one step.
    #[must_use]
    pub fn lookup(&self, distance: i32, mask: TierMask) -> LookupResult<'_, P> {
        LookupResult::from_aggregates(self.query(distance, mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashMap;

    const SAMPLE_SIZE: u64 = 100_000;
    const TOLERANCE: f64 = 0.01;

    fn weighted(name: &'static str, tier: u8, weight: u32, duration: u32) -> Recipe<&'static str> {
        Recipe::new(0, 10, tier, weight, duration, name)
    }

    #[test]
    fn pick_index_ties_go_to_the_earlier_element() {
        assert_eq!(pick_index([3, 5, 2], 3.0), (0, 3.0));
        assert_eq!(pick_index([3, 5, 2], 3.5), (1, 0.5));
        assert_eq!(pick_index([3, 5, 2], 8.0), (1, 5.0));
        assert_eq!(pick_index([3, 5, 2], 0.0), (0, 0.0));
    }

    #[test]
    fn pick_index_clamps_overshoot_to_last() {
        assert_eq!(pick_index([3, 5, 2], 10.0), (2, 2.0));
        let (idx, rest) = pick_index([3, 5, 2], 10.000_001);
        assert_eq!(idx, 2);
        assert!(rest > 2.0);
        assert_eq!(pick_index([7], 1_000.0).0, 0);
    }

    #[test]
    #[should_panic(expected = "empty weight list")]
    fn pick_index_rejects_empty_list() {
        let _ = pick_index(Vec::<u64>::new(), 0.0);
    }

    #[test]
    #[should_panic(expected = "sampling requires")]
    fn sampling_nothing_panics() {
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let _ = sample::<(), _>(&[], &mut rng);
    }

    #[test]
    #[should_panic(expected = "sampling requires")]
    fn empty_lookup_sample_panics() {
        let index = AsteroidIndex::build(vec![weighted("A", 0, 1, 1)]).unwrap();
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let _ = index.lookup(50, TierMask::ALL).sample(&mut rng);
    }

    #[test]
    fn try_sample_on_empty_lookup_is_none() {
        let index = AsteroidIndex::build(vec![weighted("A", 0, 1, 1)]).unwrap();
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let result = index.lookup(50, TierMask::ALL);
        assert!(result.is_empty());
        assert!(result.try_sample(&mut rng).is_none());
        assert!(result.expected_duration().abs() < f64::EPSILON);
    }

    #[test]
    fn single_recipe_is_always_chosen() {
        let index = AsteroidIndex::build(vec![weighted("only", 3, 9, 1)]).unwrap();
        let result = index.lookup(5, TierMask::ALL);
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        for _ in 0..100 {
            assert_eq!(result.sample(&mut rng).payload, "only");
        }
    }

    #[test]
    fn maximal_roll_lands_on_last_recipe() {
        let index = AsteroidIndex::build(vec![
            weighted("a", 0, 1, 1),
            weighted("b", 1, 1, 1),
            weighted("c", 1, 2, 1),
        ])
        .unwrap();
        let result = index.lookup(0, TierMask::ALL);
        let mut rng = StepRng::new(u64::MAX, 0);
        assert_eq!(result.sample(&mut rng).payload, "c");
        let mut rng = StepRng::new(0, 0);
        assert_eq!(result.sample(&mut rng).payload, "a");
    }

    #[test]
    fn expected_duration_is_weight_averaged() {
        let index = AsteroidIndex::build(vec![
            weighted("fast", 0, 3, 100),
            weighted("slow", 2, 1, 500),
        ])
        .unwrap();
        let result = index.lookup(1, TierMask::ALL);
        assert_eq!(result.total_weight(), 4);
        assert_eq!(result.total_weighted_duration(), 800);
        assert!((result.expected_duration() - 200.0).abs() < f64::EPSILON);
        assert_eq!(result.recipes().count(), 2);

        let only_slow = index.lookup(1, TierMask::NONE.with(2));
        assert!((only_slow.expected_duration() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn frequencies_follow_weights_across_tiers() {
        let weights = [("a", 0, 1), ("b", 0, 2), ("c", 1, 3), ("d", 4, 4)];
        let recipes = weights
            .iter()
            .map(|&(name, tier, weight)| weighted(name, tier, weight, 20))
            .collect();
        let index = AsteroidIndex::build(recipes).unwrap();
        let result = index.lookup(5, TierMask::ALL);
        assert_eq!(result.aggregates().len(), 3);

        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for _ in 0..SAMPLE_SIZE {
            *counts.entry(result.sample(&mut rng).payload).or_default() += 1;
        }

        let total: u32 = weights.iter().map(|&(_, _, weight)| weight).sum();
        for (name, _, weight) in weights {
            let observed = ratio(counts[name], SAMPLE_SIZE);
            let expected = ratio(u64::from(weight), u64::from(total));
            assert!(
                (observed - expected).abs() < TOLERANCE,
                "{name}: observed {observed:.4}, expected {expected:.4}"
            );
        }
    }

    #[test]
    fn free_function_matches_lookup_sampling() {
        let index = AsteroidIndex::build(vec![
            weighted("a", 0, 5, 1),
            weighted("b", 2, 5, 1),
        ])
        .unwrap();
        let collected: Vec<_> = index.query(3, TierMask::ALL).collect();
        let result = index.lookup(3, TierMask::ALL);
        let mut left = ChaCha20Rng::from_seed([3u8; 32]);
        let mut right = ChaCha20Rng::from_seed([3u8; 32]);
        for _ in 0..64 {
            let free = sample(&collected, &mut left);
            let bundled = result.sample(&mut right);
            assert!(Arc::ptr_eq(free, bundled));
        }
    }
}
