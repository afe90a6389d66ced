//! One asteroid index per mining-module tier.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogFilter, MiningRecipe};
use crate::constants::{DEFAULT_MODULE_TIERS, LOG_TARGET_BUILD};
use crate::index::AsteroidIndex;
use crate::query::TierMask;
use crate::recipe::{Recipe, RecipeError, validate_all};
use crate::sampler::LookupResult;

/// Payloads that name the lowest module tier able to run them.
pub trait ModuleGated {
    fn module_tier(&self) -> u8;
}

impl ModuleGated for MiningRecipe {
    fn module_tier(&self) -> u8 {
        self.module_tier
    }
}

/// Settings for building [`ModuleTables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Number of module tiers; one table is built for each of `1..=module_tiers`.
    #[serde(default = "TableConfig::default_module_tiers")]
    pub module_tiers: u8,
    /// Content packs whose asteroids are included.
    #[serde(default)]
    pub enabled_packs: Vec<String>,
}

impl TableConfig {
    const fn default_module_tiers() -> u8 {
        DEFAULT_MODULE_TIERS
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_tiers == 0 {
            return Err(ConfigError::MinViolation {
                field: "module_tiers",
                min: 1,
                value: 0,
            });
        }
        if let Some(position) = self
            .enabled_packs
            .iter()
            .position(|pack| pack.trim().is_empty())
        {
            return Err(ConfigError::BlankPack { position });
        }
        Ok(())
    }

    #[must_use]
    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter::with_packs(self.enabled_packs.iter().cloned())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            module_tiers: Self::default_module_tiers(),
            enabled_packs: Vec::new(),
        }
    }
}

/// Errors raised when table configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("enabled_packs[{position}] is blank")]
    BlankPack { position: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Recipe(#[from] RecipeError),
    #[error("module tier {requested} is not in 1..={available}")]
    UnknownModuleTier { requested: u8, available: u8 },
}

/// Asteroid indices keyed by module tier, each holding the recipes that tier can reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTables<P> {
    tables: Vec<AsteroidIndex<P>>,
}

impl<P> ModuleTables<P>
where
    P: ModuleGated + Clone,
{
    /// Build one table per module tier in `1..=config.module_tiers`.
    ///
    /// Table `t` holds the recipes whose module tier is at most `t`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Config`] for an invalid configuration and
    /// [`TableError::Recipe`] naming the input position of the first invalid recipe,
    /// whether or not any table can reach it.
    pub fn build(recipes: &[Recipe<P>], config: &TableConfig) -> Result<Self, TableError> {
        config.validate()?;
        validate_all(recipes)?;
        info!(
            target: LOG_TARGET_BUILD,
            "building asteroid tables: {} module tiers from {} recipes",
            config.module_tiers,
            recipes.len()
        );
        let unreachable = recipes
            .iter()
            .filter(|recipe| recipe.payload.module_tier() > config.module_tiers)
            .count();
        if unreachable > 0 {
            debug!(
                target: LOG_TARGET_BUILD,
                "{unreachable} recipes need a module tier above {}",
                config.module_tiers
            );
        }
        let tables = (1..=config.module_tiers)
            .map(|module_tier| {
                let reachable = recipes
                    .iter()
                    .filter(|recipe| recipe.payload.module_tier() <= module_tier)
                    .cloned()
                    .collect();
                AsteroidIndex::build(reachable).map_err(TableError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tables })
    }
}

impl<P> ModuleTables<P> {
    /// Number of module tiers covered.
    #[must_use]
    pub fn module_tiers(&self) -> u8 {
        u8::try_from(self.tables.len()).unwrap_or(u8::MAX)
    }

    #[must_use]
    pub fn table(&self, module_tier: u8) -> Option<&AsteroidIndex<P>> {
        let slot = usize::from(module_tier).checked_sub(1)?;
        self.tables.get(slot)
    }

    /// Tables in increasing module tier order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &AsteroidIndex<P>)> {
        (1..=u8::MAX).zip(self.tables.iter())
    }

    /// Query the table for `module_tier`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownModuleTier`] when no table exists for `module_tier`.
    pub fn lookup(
        &self,
        distance: i32,
        mask: TierMask,
        module_tier: u8,
    ) -> Result<LookupResult<'_, P>, TableError> {
        let table = self
            .table(module_tier)
            .ok_or(TableError::UnknownModuleTier {
                requested: module_tier,
                available: self.module_tiers(),
            })?;
        Ok(table.lookup(distance, mask))
    }
}
