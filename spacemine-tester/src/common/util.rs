use anyhow::{Result, bail};
use spacemine_core::{DroneTiers, TierMask};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Turn a comma-separated list of drone tier names into a mask.
///
/// `all` selects every tier in the registry.
pub fn parse_drone_mask(tiers: &DroneTiers, csv: &str) -> Result<TierMask> {
    let mut mask = TierMask::NONE;
    for token in split_csv(csv) {
        if token.eq_ignore_ascii_case("all") {
            mask = tiers.iter().map(|tier| tier.key).fold(mask, TierMask::with);
            continue;
        }
        let Some(tier) = tiers.by_name(&token) else {
            bail!("Unknown drone tier: {token}");
        };
        mask = mask.with(tier.key);
    }
    if mask.is_empty() {
        bail!("No drone tiers selected");
    }
    Ok(mask)
}
