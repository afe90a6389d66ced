//! Centralized limits and tuning constants for the asteroid index.
//!
//! Values that shape recipe expansion or lookup live here so that changes to
//! them are reviewed alongside the code rather than hidden in JSON assets.

// Logging targets ------------------------------------------------------------
pub(crate) const LOG_TARGET_BUILD: &str = "spacemine::build";
pub(crate) const LOG_TARGET_QUERY: &str = "spacemine::query";
pub(crate) const LOG_TARGET_CATALOG: &str = "spacemine::catalog";

// Tier dimension -------------------------------------------------------------
/// Number of tier bits carried by a `TierMask`; tier keys must be below this.
pub const TIER_MASK_WIDTH: u8 = 32;

// Distance dimension ---------------------------------------------------------
/// Sweep cursor before the first possible distance.
pub(crate) const SWEEP_CURSOR_SENTINEL: i64 = i64::MIN;

// Module tables --------------------------------------------------------------
/// Mining-module tiers built when no configuration overrides it.
pub const DEFAULT_MODULE_TIERS: u8 = 3;

// Catalog --------------------------------------------------------------------
/// Game ticks per second, used by the bundled catalog's durations.
pub const TICKS_PER_SECOND: u32 = 20;
/// Output chances are expressed in hundredths of a percent.
pub const CHANCE_SCALE: u32 = 10_000;
/// Name under which the table configuration is loaded.
pub const TABLE_CONFIG_NAME: &str = "tables";
