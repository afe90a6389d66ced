//! Spacemine Core
//!
//! Distance-indexed asteroid lookup for space mining. Recipes valid over
//! overlapping distance ranges are decomposed into disjoint canonical intervals,
//! grouped per equipment tier with precomputed weight sums, and served through a
//! floor lookup plus a tier bitmask. A weighted sampler picks one recipe from
//! the result. This crate carries no UI or I/O beyond its bundled assets.

pub mod catalog;
pub mod constants;
pub mod index;
pub mod interval;
pub mod numbers;
pub mod query;
pub mod recipe;
pub mod rng;
pub mod sampler;
pub mod tables;

// Re-export commonly used types
pub use catalog::{
    AsteroidCatalog, AsteroidDef, Bounds, CatalogError, CatalogFilter, DroneSpan, DroneTier,
    DroneTiers, Equipment, MiningRecipe, OutputEntry, Outputs, ticks_to_seconds,
};
pub use index::{AsteroidIndex, IntervalEntry, TierAggregate};
pub use interval::{CanonicalInterval, IntervalSpan, sweep};
pub use query::{TierAggregates, TierMask, query};
pub use recipe::{Recipe, RecipeError, RecipeId, TierKey, validate_all};
pub use rng::{CountingRng, RngBundle};
pub use sampler::{LookupResult, pick_index, sample};
pub use tables::{ConfigError, ModuleGated, ModuleTables, TableConfig, TableError};

use anyhow::Context;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::constants::TABLE_CONFIG_NAME;

/// Trait for abstracting catalog loading operations
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the asteroid catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<AsteroidCatalog, Self::Error>;

    /// Load configuration data by name
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned;
}

#[derive(Debug, Error)]
pub enum StaticLoadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("no bundled configuration named {0:?}")]
    UnknownConfig(String),
    #[error("failed to parse bundled configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Loader serving the catalog and configuration bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl CatalogLoader for StaticCatalogLoader {
    type Error = StaticLoadError;

    fn load_catalog(&self) -> Result<AsteroidCatalog, Self::Error> {
        Ok(AsteroidCatalog::load_from_static()?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        match config_name {
            TABLE_CONFIG_NAME => Ok(serde_json::from_str(include_str!(
                "../assets/data/tables.json"
            ))?),
            other => Err(StaticLoadError::UnknownConfig(other.to_string())),
        }
    }
}

/// Builds module tables from whatever catalog the loader provides.
pub struct MiningEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
    tiers: DroneTiers,
}

impl<L> MiningEngine<L>
where
    L: CatalogLoader,
{
    /// Create an engine over the standard drone tiers.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            tiers: DroneTiers::standard(),
        }
    }

    pub const fn tiers(&self) -> &DroneTiers {
        &self.tiers
    }

    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Load the table configuration through the loader and build with it.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, validation, expansion or building fails.
    pub fn build_tables(&self) -> anyhow::Result<ModuleTables<MiningRecipe>> {
        let config: TableConfig = self
            .loader
            .load_config(TABLE_CONFIG_NAME)
            .context("loading table configuration")?;
        self.build_tables_with(&config)
    }

    /// Build with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, validation, expansion or building fails.
    pub fn build_tables_with(
        &self,
        config: &TableConfig,
    ) -> anyhow::Result<ModuleTables<MiningRecipe>> {
        let recipes = self.load_recipes(config)?;
        let tables = ModuleTables::build(&recipes, config).context("building asteroid tables")?;
        Ok(tables)
    }

    /// Load the catalog and expand the asteroids `config` enables into recipes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the catalog cannot be
    /// loaded or expanded.
    pub fn load_recipes(&self, config: &TableConfig) -> anyhow::Result<Vec<Recipe<MiningRecipe>>> {
        config.validate().context("validating table configuration")?;
        let catalog = self
            .loader
            .load_catalog()
            .context("loading asteroid catalog")?;
        catalog
            .expand(&self.tiers, &config.filter())
            .context("expanding asteroid catalog")
    }
}
