//! Asteroid definitions and their expansion into per-drone-tier recipes.
//!
//! A definition describes one asteroid once. Expansion emits one recipe for every
//! drone tier the asteroid accepts: stronger drones bring back bigger hauls faster,
//! and for ore asteroids they also draw more power.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::constants::{CHANCE_SCALE, LOG_TARGET_CATALOG, TICKS_PER_SECOND};
use crate::numbers::ceil_f64_to_u32;
use crate::recipe::{Recipe, RecipeError, RecipeId, TierKey};

const STANDARD_TIERS: [(&str, &str); 13] = [
    ("LV", "Steel"),
    ("MV", "Aluminium"),
    ("HV", "StainlessSteel"),
    ("EV", "Titanium"),
    ("IV", "TungstenSteel"),
    ("LuV", "Osmiridium"),
    ("ZPM", "Europium"),
    ("UV", "Tritanium"),
    ("UHV", "Neutronium"),
    ("UEV", "CosmicNeutronium"),
    ("UIV", "InfinityCatalyst"),
    ("UMV", "Infinity"),
    ("UXV", "SpaceTime"),
];

/// Items a mining operation consumes at one drone tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equipment {
    pub drone: String,
    pub drill: String,
    pub rod: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneTier {
    pub key: TierKey,
    pub name: String,
    pub equipment: Equipment,
}

/// Immutable registry of drone tiers, ordered by tier key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroneTiers {
    tiers: Vec<DroneTier>,
    by_drone: HashMap<String, TierKey>,
}

impl DroneTiers {
    /// The thirteen tiers from LV to UXV.
    #[must_use]
    pub fn standard() -> Self {
        let tiers = STANDARD_TIERS
            .iter()
            .zip(0..)
            .map(|(&(name, material), key)| DroneTier {
                key,
                name: name.to_string(),
                equipment: Equipment {
                    drone: format!("miningDrone{name}"),
                    drill: format!("toolHeadDrill{material}"),
                    rod: format!("stick{material}"),
                },
            })
            .collect();
        Self::from_tiers(tiers)
    }

    fn from_tiers(tiers: Vec<DroneTier>) -> Self {
        let by_drone = tiers
            .iter()
            .map(|tier| (tier.equipment.drone.clone(), tier.key))
            .collect();
        Self { tiers, by_drone }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DroneTier> {
        self.tiers.iter()
    }

    #[must_use]
    pub fn get(&self, key: TierKey) -> Option<&DroneTier> {
        self.tiers.get(usize::from(key))
    }

    /// Case-insensitive lookup by tier name, e.g. `"luv"`.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&DroneTier> {
        self.tiers
            .iter()
            .find(|tier| tier.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a drone item back to its tier.
    #[must_use]
    pub fn by_drone(&self, drone_id: &str) -> Option<TierKey> {
        self.by_drone.get(drone_id).copied()
    }

    #[must_use]
    pub fn equipment(&self, key: TierKey) -> Option<&Equipment> {
        self.get(key).map(|tier| &tier.equipment)
    }
}

impl Default for DroneTiers {
    fn default() -> Self {
        Self::standard()
    }
}

/// One possible output with its chance in hundredths of a percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub id: String,
    pub chance: u32,
}

impl OutputEntry {
    /// Chance as a probability in `[0, 1]`.
    #[must_use]
    pub fn probability(&self) -> f64 {
        f64::from(self.chance) / f64::from(CHANCE_SCALE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outputs {
    /// Ore materials, produced in the form named by `prefix`.
    Ores {
        prefix: String,
        entries: Vec<OutputEntry>,
    },
    /// Fixed items.
    Items { entries: Vec<OutputEntry> },
}

impl Outputs {
    #[must_use]
    pub fn entries(&self) -> &[OutputEntry] {
        match self {
            Self::Ores { entries, .. } | Self::Items { entries } => entries,
        }
    }

    /// Ore hauls draw more power with stronger drones; item hauls do not.
    #[must_use]
    pub const fn scales_power(&self) -> bool {
        matches!(self, Self::Ores { .. })
    }

    #[must_use]
    pub fn chance_total(&self) -> u64 {
        self.entries()
            .iter()
            .map(|entry| u64::from(entry.chance))
            .sum()
    }
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i32,
    pub max: i32,
}

/// First and last accepted drone tier, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneSpan {
    pub start: String,
    pub end: String,
}

/// Catalog entry for one asteroid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsteroidDef {
    pub id: String,
    pub outputs: Outputs,
    pub size: Bounds,
    pub distance: Bounds,
    /// Computation required per second.
    pub computation: u32,
    /// Lowest mining-module tier able to reach the asteroid.
    #[serde(default = "default_module_tier")]
    pub module_tier: u8,
    /// Base duration in ticks.
    pub duration: u32,
    pub eut: u32,
    pub drones: DroneSpan,
    pub weight: u32,
    /// Content pack that must be enabled for the asteroid to exist.
    #[serde(default)]
    pub requires: Option<String>,
}

const fn default_module_tier() -> u8 {
    1
}

/// Payload carried by every expanded recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningRecipe {
    pub asteroid: String,
    pub drone_tier: TierKey,
    pub inputs: Equipment,
    pub outputs: Outputs,
    pub size: Bounds,
    pub computation: u32,
    pub module_tier: u8,
    pub eut: u32,
}

/// Convert a tick count to seconds.
#[must_use]
pub fn ticks_to_seconds(ticks: f64) -> f64 {
    ticks / f64::from(TICKS_PER_SECOND)
}

/// Content packs allowed to contribute asteroids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub enabled_packs: BTreeSet<String>,
}

impl CatalogFilter {
    /// Base content only.
    #[must_use]
    pub fn base() -> Self {
        Self::default()
    }

    pub fn with_packs<I, S>(packs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled_packs: packs.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn allows(&self, asteroid: &AsteroidDef) -> bool {
        asteroid
            .requires
            .as_ref()
            .is_none_or(|pack| self.enabled_packs.contains(pack))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse asteroid catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("asteroid id {0:?} is defined more than once")]
    DuplicateAsteroid(String),
    #[error("asteroid {asteroid}: unknown drone tier {name:?}")]
    UnknownDroneTier { asteroid: String, name: String },
    #[error("asteroid {asteroid}: drone span {start}..={end} is inverted")]
    InvertedDroneSpan {
        asteroid: String,
        start: String,
        end: String,
    },
    #[error("asteroid {asteroid}: size {min}..={max} is inverted")]
    InvertedSize { asteroid: String, min: i32, max: i32 },
    #[error("asteroid {asteroid}: output chances must sum to a positive value")]
    NoOutputChance { asteroid: String },
    #[error("asteroid {asteroid}: output {output} has chance {chance}, above {scale}")]
    ChanceOutOfRange {
        asteroid: String,
        output: String,
        chance: u32,
        scale: u32,
    },
    #[error("asteroid {asteroid} with {tier} drones: {source}")]
    Recipe {
        asteroid: String,
        tier: String,
        source: RecipeError,
    },
}

/// Container for all asteroid definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsteroidCatalog {
    pub asteroids: Vec<AsteroidDef>,
}

impl AsteroidCatalog {
    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] when the JSON does not describe a catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn from_asteroids(asteroids: Vec<AsteroidDef>) -> Self {
        Self { asteroids }
    }

    /// Parse the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if the bundled asset is malformed.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(include_str!("../assets/data/asteroids.json"))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AsteroidDef> {
        self.asteroids.iter().find(|asteroid| asteroid.id == id)
    }

    /// Every content pack some asteroid requires.
    #[must_use]
    pub fn packs(&self) -> BTreeSet<&str> {
        self.asteroids
            .iter()
            .filter_map(|asteroid| asteroid.requires.as_deref())
            .collect()
    }

    /// Check every definition against the tier registry.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in catalog order.
    pub fn validate(&self, tiers: &DroneTiers) -> Result<(), CatalogError> {
        let mut seen = BTreeSet::new();
        for asteroid in &self.asteroids {
            if !seen.insert(asteroid.id.as_str()) {
                return Err(CatalogError::DuplicateAsteroid(asteroid.id.clone()));
            }
            validate_asteroid(asteroid, tiers)?;
        }
        Ok(())
    }

    /// Expand the definitions `filter` allows into recipes, one per accepted drone tier.
    ///
    /// # Errors
    ///
    /// Returns the first invalid definition or expanded recipe.
    pub fn expand(
        &self,
        tiers: &DroneTiers,
        filter: &CatalogFilter,
    ) -> Result<Vec<Recipe<MiningRecipe>>, CatalogError> {
        self.validate(tiers)?;
        let mut recipes = Vec::new();
        let mut skipped = 0_usize;
        for asteroid in &self.asteroids {
            if !filter.allows(asteroid) {
                skipped += 1;
                debug!(
                    target: LOG_TARGET_CATALOG,
                    "skipping {} (requires {:?})",
                    asteroid.id,
                    asteroid.requires
                );
                continue;
            }
            expand_asteroid(asteroid, tiers, &mut recipes)?;
        }
        info!(
            target: LOG_TARGET_CATALOG,
            "expanded {} asteroids into {} recipes ({skipped} skipped)",
            self.asteroids.len() - skipped,
            recipes.len()
        );
        Ok(recipes)
    }
}

fn resolve_span<'t>(
    asteroid: &AsteroidDef,
    tiers: &'t DroneTiers,
) -> Result<(&'t DroneTier, &'t DroneTier), CatalogError> {
    let lookup = |name: &str| {
        tiers
            .by_name(name)
            .ok_or_else(|| CatalogError::UnknownDroneTier {
                asteroid: asteroid.id.clone(),
                name: name.to_string(),
            })
    };
    let start = lookup(&asteroid.drones.start)?;
    let end = lookup(&asteroid.drones.end)?;
    if end.key < start.key {
        return Err(CatalogError::InvertedDroneSpan {
            asteroid: asteroid.id.clone(),
            start: start.name.clone(),
            end: end.name.clone(),
        });
    }
    Ok((start, end))
}

fn validate_asteroid(asteroid: &AsteroidDef, tiers: &DroneTiers) -> Result<(), CatalogError> {
    resolve_span(asteroid, tiers)?;
    if asteroid.size.max < asteroid.size.min {
        return Err(CatalogError::InvertedSize {
            asteroid: asteroid.id.clone(),
            min: asteroid.size.min,
            max: asteroid.size.max,
        });
    }
    if let Some(entry) = asteroid
        .outputs
        .entries()
        .iter()
        .find(|entry| entry.chance > CHANCE_SCALE)
    {
        return Err(CatalogError::ChanceOutOfRange {
            asteroid: asteroid.id.clone(),
            output: entry.id.clone(),
            chance: entry.chance,
            scale: CHANCE_SCALE,
        });
    }
    if asteroid.outputs.chance_total() == 0 {
        return Err(CatalogError::NoOutputChance {
            asteroid: asteroid.id.clone(),
        });
    }
    Ok(())
}

fn expand_asteroid(
    asteroid: &AsteroidDef,
    tiers: &DroneTiers,
    recipes: &mut Vec<Recipe<MiningRecipe>>,
) -> Result<(), CatalogError> {
    let (start, end) = resolve_span(asteroid, tiers)?;
    for tier in &tiers.tiers[usize::from(start.key)..=usize::from(end.key)] {
        let step = u32::from(tier.key - start.key);
        let speedup = f64::from(step + 1).sqrt();
        let growth = 2_i32.saturating_pow(step) - 1;
        let eut = if asteroid.outputs.scales_power() {
            ceil_f64_to_u32(f64::from(asteroid.eut) * speedup)
        } else {
            asteroid.eut
        };
        let recipe = Recipe::new(
            asteroid.distance.min,
            asteroid.distance.max,
            tier.key,
            asteroid.weight,
            ceil_f64_to_u32(f64::from(asteroid.duration) / speedup),
            MiningRecipe {
                asteroid: asteroid.id.clone(),
                drone_tier: tier.key,
                inputs: tier.equipment.clone(),
                outputs: asteroid.outputs.clone(),
                size: Bounds {
                    min: asteroid.size.min.saturating_add(growth),
                    max: asteroid.size.max.saturating_add(growth),
                },
                computation: asteroid.computation,
                module_tier: asteroid.module_tier,
                eut,
            },
        );
        recipe
            .validate(RecipeId(recipes.len()))
            .map_err(|source| CatalogError::Recipe {
                asteroid: asteroid.id.clone(),
                tier: tier.name.clone(),
                source,
            })?;
        recipes.push(recipe);
    }
    Ok(())
}
