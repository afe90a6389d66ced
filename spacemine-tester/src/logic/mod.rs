pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use scenarios::{MiningFixture, Probe, Scenario, list_scenarios};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
