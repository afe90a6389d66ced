use colored::Colorize;
use serde::{Deserialize, Serialize};
use spacemine_core::RngBundle;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::scenarios::{MiningFixture, Scenario};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub checks: usize,
    pub failures: Vec<String>,
    pub notes: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

pub struct MiningTester {
    fixture: Arc<MiningFixture>,
    verbose: bool,
}

impl MiningTester {
    pub const fn new(fixture: Arc<MiningFixture>, verbose: bool) -> Self {
        Self { fixture, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key().bright_white()
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let rngs = RngBundle::from_user_seed(seed);
        let start_time = Instant::now();
        let outcome = scenario.run(&self.fixture, &rngs, iterations);
        let duration = start_time.elapsed();
        let (checks, failures, notes) = outcome.into_failures();

        if self.verbose {
            if failures.is_empty() {
                println!("  ✅ {checks} checks passed ({duration:?})");
            } else {
                for failure in &failures {
                    println!("  ❌ {}", failure.red());
                }
            }
        }
        log::debug!(
            "scenario {} seed {seed}: {checks} checks, {} failures, {} sampling draws",
            scenario.key(),
            failures.len(),
            rngs.sampling().draws()
        );

        ScenarioResult {
            scenario_name: scenario.key().to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            checks,
            failures,
            notes,
            duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
