use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use spacemine_core::{AsteroidIndex, Recipe, TierKey, TierMask};
use std::collections::BTreeSet;

const RANDOM_SETS: u64 = 40;

fn random_recipes(rng: &mut SmallRng, count: usize) -> Vec<Recipe<usize>> {
    (0..count)
        .map(|idx| {
            let min = rng.gen_range(-50..150);
            let span = rng.gen_range(0..60);
            let tier: TierKey = rng.gen_range(0..6);
            Recipe::new(
                min,
                min + span,
                tier,
                rng.gen_range(1..500),
                rng.gen_range(1..2_000),
                idx,
            )
        })
        .collect()
}

fn brute_force(recipes: &[Recipe<usize>], distance: i32, mask: TierMask) -> BTreeSet<usize> {
    recipes
        .iter()
        .filter(|recipe| recipe.contains(distance) && mask.contains(recipe.tier))
        .map(|recipe| recipe.payload)
        .collect()
}

fn indexed(index: &AsteroidIndex<usize>, distance: i32, mask: TierMask) -> BTreeSet<usize> {
    index
        .query(distance, mask)
        .flat_map(|aggregate| aggregate.members().iter().map(|recipe| recipe.payload))
        .collect()
}

fn probe_distances(index: &AsteroidIndex<usize>) -> BTreeSet<i32> {
    let mut probes = BTreeSet::new();
    for (interval, _) in index.intervals() {
        for edge in [
            interval.start - 1,
            interval.start,
            interval.end - 1,
            interval.end,
        ] {
            if let Ok(distance) = i32::try_from(edge) {
                probes.insert(distance);
            }
        }
    }
    probes
}

#[test]
fn boundary_membership_matches_brute_force() {
    for seed in 0..RANDOM_SETS {
        let mut rng = SmallRng::seed_from_u64(seed);
        let count = rng.gen_range(0..40);
        let recipes = random_recipes(&mut rng, count);
        let index = AsteroidIndex::build(recipes.clone()).unwrap();
        let masks = [
            TierMask::ALL,
            TierMask::from_tiers([0, 2, 4]),
            TierMask::from_bits(rng.r#gen()),
        ];
        for distance in probe_distances(&index) {
            for mask in masks {
                assert_eq!(
                    indexed(&index, distance, mask),
                    brute_force(&recipes, distance, mask),
                    "seed {seed} distance {distance} mask {:#x}",
                    mask.bits()
                );
            }
        }
        for _ in 0..200 {
            let distance = rng.gen_range(-80..260);
            assert_eq!(
                indexed(&index, distance, TierMask::ALL),
                brute_force(&recipes, distance, TierMask::ALL),
                "seed {seed} distance {distance}"
            );
        }
    }
}

#[test]
fn intervals_are_disjoint_and_maximal() {
    for seed in 0..RANDOM_SETS {
        let mut rng = SmallRng::seed_from_u64(seed ^ 0x5eed);
        let recipes = random_recipes(&mut rng, 30);
        let index = AsteroidIndex::build(recipes.clone()).unwrap();
        let spans: Vec<_> = index.intervals().collect();
        for pair in spans.windows(2) {
            let (left, left_entry) = pair[0];
            let (right, right_entry) = pair[1];
            assert!(left.end <= right.start, "seed {seed}: overlapping intervals");
            if left.end == right.start {
                let at = |interval: i64| {
                    indexed(&index, i32::try_from(interval).unwrap(), TierMask::ALL)
                };
                assert_ne!(
                    at(left.start),
                    at(right.start),
                    "seed {seed}: adjacent intervals share membership"
                );
                assert_ne!(left_entry.tiers(), right_entry.tiers());
            }
        }
    }
}

#[test]
fn aggregate_sums_are_exact() {
    let mut rng = SmallRng::seed_from_u64(99);
    let recipes = random_recipes(&mut rng, 60);
    let index = AsteroidIndex::build(recipes).unwrap();
    for (_, entry) in index.intervals() {
        for (slot, aggregate) in entry.tiers().iter().enumerate() {
            let Some(aggregate) = aggregate else {
                continue;
            };
            assert_eq!(usize::from(aggregate.tier()), slot);
            let weight: u64 = aggregate
                .members()
                .iter()
                .map(|recipe| u64::from(recipe.weight))
                .sum();
            let weighted_duration: u64 = aggregate
                .members()
                .iter()
                .map(|recipe| u64::from(recipe.weight) * u64::from(recipe.duration))
                .sum();
            assert_eq!(aggregate.total_weight(), weight);
            assert_eq!(aggregate.total_weighted_duration(), weighted_duration);
            assert!(
                aggregate
                    .members()
                    .windows(2)
                    .all(|pair| pair[0].payload < pair[1].payload),
                "members keep input order"
            );
        }
        assert!(entry.tiers().last().is_some_and(Option::is_some));
    }
}

#[test]
fn point_recipe_answers_only_its_distance() {
    let index = AsteroidIndex::build(vec![Recipe::new(5, 5, 1, 3, 7, 0_usize)]).unwrap();
    assert_eq!(indexed(&index, 5, TierMask::ALL), BTreeSet::from([0]));
    assert!(indexed(&index, 4, TierMask::ALL).is_empty());
    assert!(indexed(&index, 6, TierMask::ALL).is_empty());
    assert!(indexed(&index, 5, TierMask::NONE.with(0)).is_empty());
}

#[test]
fn extreme_distances_are_indexable() {
    let recipes = vec![
        Recipe::new(i32::MIN, i32::MIN, 0, 1, 1, 0_usize),
        Recipe::new(i32::MAX, i32::MAX, 0, 1, 1, 1_usize),
        Recipe::new(i32::MIN, i32::MAX, 1, 1, 1, 2_usize),
    ];
    let index = AsteroidIndex::build(recipes).unwrap();
    assert_eq!(indexed(&index, i32::MIN, TierMask::ALL), BTreeSet::from([0, 2]));
    assert_eq!(indexed(&index, 0, TierMask::ALL), BTreeSet::from([2]));
    assert_eq!(indexed(&index, i32::MAX, TierMask::ALL), BTreeSet::from([1, 2]));
    assert_eq!(index.interval_count(), 3);
}
