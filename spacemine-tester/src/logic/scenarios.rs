use rand::Rng;
use spacemine_core::numbers::{ratio, u64_to_f64, usize_to_u64};
use spacemine_core::{
    AsteroidIndex, DroneTiers, MiningRecipe, ModuleGated, ModuleTables, Recipe, RngBundle,
    TierKey, TierMask, ticks_to_seconds,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const RANDOM_PROBES_PER_ITERATION: usize = 100;
const PROBE_MARGIN: i32 = 10;
const SAMPLES_PER_ITERATION: usize = 1000;
const MAX_REPORTED_FAILURES: usize = 25;

/// Where the `distribution` and `query` scenarios look.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub distance: i32,
    pub mask: TierMask,
    pub module_tier: u8,
}

/// Everything the scenarios read: the recipe snapshot and the tables built from it.
#[derive(Debug)]
pub struct MiningFixture {
    pub tiers: DroneTiers,
    pub recipes: Vec<Recipe<MiningRecipe>>,
    pub tables: Arc<ModuleTables<MiningRecipe>>,
    pub probe: Probe,
}

impl MiningFixture {
    fn reachable(&self, module_tier: u8) -> Vec<&Recipe<MiningRecipe>> {
        self.recipes
            .iter()
            .filter(|recipe| recipe.payload.module_tier() <= module_tier)
            .collect()
    }

    fn tier_name(&self, key: TierKey) -> &str {
        self.tiers.get(key).map_or("?", |tier| tier.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Coverage,
    Aggregates,
    Distribution,
    Query,
}

impl Scenario {
    pub const ALL: [Self; 4] = [
        Self::Coverage,
        Self::Aggregates,
        Self::Distribution,
        Self::Query,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Coverage => "coverage",
            Self::Aggregates => "aggregates",
            Self::Distribution => "distribution",
            Self::Query => "query",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Coverage => "Query membership matches a brute-force scan at every boundary",
            Self::Aggregates => "Aggregate sums are exact and absent tiers stay empty",
            Self::Distribution => "Sampled frequencies track recipe weights at the probe",
            Self::Query => "Show what the probe distance and drones can mine",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.key().eq_ignore_ascii_case(key))
    }

    pub fn run(self, fixture: &MiningFixture, rngs: &RngBundle, iterations: usize) -> Outcome {
        let mut outcome = Outcome::default();
        match self {
            Self::Coverage => coverage(fixture, rngs, iterations, &mut outcome),
            Self::Aggregates => aggregates(fixture, &mut outcome),
            Self::Distribution => distribution(fixture, rngs, iterations, &mut outcome),
            Self::Query => query(fixture, &mut outcome),
        }
        outcome
    }
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    Scenario::ALL
        .into_iter()
        .map(|scenario| (scenario.key(), scenario.description()))
}

/// Raw result of one scenario run.
#[derive(Debug, Default)]
pub struct Outcome {
    pub checks: usize,
    pub failures: Vec<String>,
    pub notes: Vec<String>,
    suppressed: usize,
}

impl Outcome {
    fn fail(&mut self, message: String) {
        if self.failures.len() < MAX_REPORTED_FAILURES {
            self.failures.push(message);
        } else {
            self.suppressed += 1;
        }
    }

    /// Failures, with a trailing line counting the ones not kept.
    pub fn into_failures(mut self) -> (usize, Vec<String>, Vec<String>) {
        if self.suppressed > 0 {
            self.failures
                .push(format!("... and {} more failures", self.suppressed));
        }
        (self.checks, self.failures, self.notes)
    }
}

type Label<'a> = (&'a str, TierKey);

fn label(recipe: &Recipe<MiningRecipe>) -> Label<'_> {
    (recipe.payload.asteroid.as_str(), recipe.tier)
}

fn indexed_labels(table: &AsteroidIndex<MiningRecipe>, distance: i32) -> BTreeSet<Label<'_>> {
    table
        .query(distance, TierMask::ALL)
        .flat_map(|aggregate| aggregate.members().iter().map(|recipe| label(recipe)))
        .collect()
}

fn boundary_probes(table: &AsteroidIndex<MiningRecipe>) -> BTreeSet<i32> {
    table
        .intervals()
        .flat_map(|(interval, _)| {
            [
                interval.start - 1,
                interval.start,
                interval.end - 1,
                interval.end,
            ]
        })
        .filter_map(|edge| i32::try_from(edge).ok())
        .collect()
}

fn coverage(fixture: &MiningFixture, rngs: &RngBundle, iterations: usize, outcome: &mut Outcome) {
    for (module_tier, table) in fixture.tables.iter() {
        let reachable = fixture.reachable(module_tier);
        let mut probes = boundary_probes(table);
        let low = reachable.iter().map(|recipe| recipe.min_distance).min();
        let high = reachable.iter().map(|recipe| recipe.max_distance).max();
        if let (Some(low), Some(high)) = (low, high) {
            let mut rng = rngs.probing();
            let low = low.saturating_sub(PROBE_MARGIN);
            let high = high.saturating_add(PROBE_MARGIN);
            for _ in 0..iterations.saturating_mul(RANDOM_PROBES_PER_ITERATION) {
                probes.insert(rng.gen_range(low..=high));
            }
        }

        let mut gaps = 0_usize;
        for &distance in &probes {
            outcome.checks += 1;
            let expected: BTreeSet<Label<'_>> = reachable
                .iter()
                .filter(|recipe| recipe.contains(distance))
                .map(|recipe| label(recipe))
                .collect();
            let actual = indexed_labels(table, distance);
            if expected.is_empty() {
                gaps += 1;
            }
            if expected != actual {
                let missing: Vec<_> = expected.difference(&actual).collect();
                let extra: Vec<_> = actual.difference(&expected).collect();
                outcome.fail(format!(
                    "module tier {module_tier} distance {distance}: missing {missing:?}, unexpected {extra:?}"
                ));
            }
        }
        outcome.notes.push(format!(
            "module tier {module_tier}: {} intervals, {} probes ({gaps} in gaps)",
            table.interval_count(),
            probes.len()
        ));
    }
}

fn aggregates(fixture: &MiningFixture, outcome: &mut Outcome) {
    for (module_tier, table) in fixture.tables.iter() {
        let reachable = fixture.reachable(module_tier);
        for (interval, entry) in table.intervals() {
            let Ok(start) = i32::try_from(interval.start) else {
                outcome.fail(format!(
                    "module tier {module_tier}: interval start {} outside distance range",
                    interval.start
                ));
                continue;
            };
            let expected_tiers: BTreeSet<TierKey> = reachable
                .iter()
                .filter(|recipe| recipe.contains(start))
                .map(|recipe| recipe.tier)
                .collect();
            let present_tiers: BTreeSet<TierKey> =
                entry.aggregates().map(|aggregate| aggregate.tier()).collect();
            outcome.checks += 1;
            if expected_tiers != present_tiers {
                outcome.fail(format!(
                    "module tier {module_tier} interval [{}, {}): tiers {present_tiers:?}, expected {expected_tiers:?}",
                    interval.start, interval.end
                ));
            }

            for (slot, aggregate) in entry.tiers().iter().enumerate() {
                let Some(aggregate) = aggregate else {
                    continue;
                };
                outcome.checks += 1;
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
                let where_ = format!(
                    "module tier {module_tier} interval [{}, {}) tier {slot}",
                    interval.start, interval.end
                );
                if usize::from(aggregate.tier()) != slot {
                    outcome.fail(format!("{where_}: stored under tier {}", aggregate.tier()));
                }
                if aggregate.members().is_empty() {
                    outcome.fail(format!("{where_}: aggregate has no members"));
                }
                if aggregate.total_weight() != weight {
                    outcome.fail(format!(
                        "{where_}: total weight {} != {weight}",
                        aggregate.total_weight()
                    ));
                }
                if aggregate.total_weighted_duration() != weighted_duration {
                    outcome.fail(format!(
                        "{where_}: total weighted duration {} != {weighted_duration}",
                        aggregate.total_weighted_duration()
                    ));
                }
            }
        }
        outcome.notes.push(format!(
            "module tier {module_tier}: {} aggregates over {} intervals",
            table.aggregate_count(),
            table.interval_count()
        ));
    }
}

/// Acceptable frequency error for probability `p` over `draws` samples: four standard errors.
fn frequency_tolerance(p: f64, draws: u64) -> f64 {
    let draws = u64_to_f64(draws.max(1));
    4.0 * (p * (1.0 - p) / draws).sqrt() + 1e-3
}

fn distribution(
    fixture: &MiningFixture,
    rngs: &RngBundle,
    iterations: usize,
    outcome: &mut Outcome,
) {
    let probe = fixture.probe;
    let result = match fixture
        .tables
        .lookup(probe.distance, probe.mask, probe.module_tier)
    {
        Ok(result) => result,
        Err(err) => {
            outcome.fail(err.to_string());
            return;
        }
    };
    if result.is_empty() {
        outcome.fail(format!(
            "nothing to sample at distance {} with mask {:#x}",
            probe.distance,
            probe.mask.bits()
        ));
        return;
    }

    let draws = iterations.saturating_mul(SAMPLES_PER_ITERATION).max(1);
    let mut counts: HashMap<Label<'_>, usize> = HashMap::new();
    {
        let mut rng = rngs.sampling();
        for _ in 0..draws {
            let recipe = result.sample(&mut *rng);
            *counts.entry(label(recipe)).or_default() += 1;
        }
    }

    let total = result.total_weight();
    for recipe in result.recipes() {
        outcome.checks += 1;
        let key = label(recipe);
        let expected = ratio(u64::from(recipe.weight), total);
        let observed = ratio(
            usize_to_u64(counts.get(&key).copied().unwrap_or(0)),
            usize_to_u64(draws),
        );
        let tolerance = frequency_tolerance(expected, usize_to_u64(draws));
        if (observed - expected).abs() > tolerance {
            outcome.fail(format!(
                "{} ({} drone): observed {observed:.4}, expected {expected:.4} ± {tolerance:.4}",
                key.0,
                fixture.tier_name(key.1)
            ));
        }
    }
    outcome.notes.push(format!(
        "distance {}: {} recipes, total weight {total}, {draws} draws",
        probe.distance,
        result.recipes().count()
    ));
}

fn query(fixture: &MiningFixture, outcome: &mut Outcome) {
    let probe = fixture.probe;
    outcome.checks += 1;
    let result = match fixture
        .tables
        .lookup(probe.distance, probe.mask, probe.module_tier)
    {
        Ok(result) => result,
        Err(err) => {
            outcome.fail(err.to_string());
            return;
        }
    };
    if result.is_empty() {
        outcome.notes.push(format!(
            "distance {}: no asteroids reachable",
            probe.distance
        ));
        return;
    }

    for aggregate in result.aggregates() {
        outcome.notes.push(format!(
            "{} drones: {} asteroids, weight {}, weighted duration {}",
            fixture.tier_name(aggregate.tier()),
            aggregate.members().len(),
            aggregate.total_weight(),
            aggregate.total_weighted_duration()
        ));
        for recipe in aggregate.members() {
            let payload = &recipe.payload;
            outcome.notes.push(format!(
                "  {} weight {} duration {} ticks {} EU/t size {}-{}",
                payload.asteroid,
                recipe.weight,
                recipe.duration,
                payload.eut,
                payload.size.min,
                payload.size.max
            ));
        }
    }
    let expected = result.expected_duration();
    outcome.notes.push(format!(
        "distance {}: expected duration {expected:.1} ticks ({:.2} s)",
        probe.distance,
        ticks_to_seconds(expected)
    ));
}
