//! Point queries: floor lookup on distance, then a tier bitmask filter.
use log::trace;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

use crate::constants::{LOG_TARGET_QUERY, TIER_MASK_WIDTH};
use crate::index::{AsteroidIndex, TierAggregate};
use crate::recipe::TierKey;

/// Set of available equipment tiers, one bit per tier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierMask(u32);

impl TierMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Build a mask from tier keys, ignoring keys the mask cannot represent.
    #[must_use]
    pub fn from_tiers<I>(tiers: I) -> Self
    where
        I: IntoIterator<Item = TierKey>,
    {
        tiers.into_iter().fold(Self::NONE, Self::with)
    }

    #[must_use]
    pub const fn with(self, tier: TierKey) -> Self {
        if tier >= TIER_MASK_WIDTH {
            return self;
        }
        Self(self.0 | (1 << tier))
    }

    #[must_use]
    pub const fn contains(self, tier: TierKey) -> bool {
        tier < TIER_MASK_WIDTH && self.0 & (1 << tier) != 0
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for TierMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

/// Lazy sequence of the aggregates selected by a query, in increasing tier order.
///
/// Bits naming tiers absent from the interval, or beyond its slot array, are skipped.
#[derive(Debug)]
pub struct TierAggregates<'a, P> {
    slots: &'a [Option<TierAggregate<P>>],
    remaining: u32,
}

impl<P> Clone for TierAggregates<'_, P> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            remaining: self.remaining,
        }
    }
}

impl<'a, P> TierAggregates<'a, P> {
    const fn empty() -> Self {
        Self {
            slots: &[],
            remaining: 0,
        }
    }
}

impl<'a, P> Iterator for TierAggregates<'a, P> {
    type Item = &'a TierAggregate<P>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining != 0 {
            let tier = self.remaining.trailing_zeros() as usize;
            self.remaining &= self.remaining - 1;
            let Some(slot) = self.slots.get(tier) else {
                // Bits are visited low to high, so nothing further can match.
                self.remaining = 0;
                break;
            };
            if let Some(aggregate) = slot.as_ref() {
                return Some(aggregate);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = self.remaining.count_ones() as usize;
        (0, Some(upper.min(self.slots.len())))
    }
}

impl<P> FusedIterator for TierAggregates<'_, P> {}

/// Aggregates of the interval containing `distance`, filtered by `mask`.
///
/// A distance outside every interval yields an empty sequence.
#[must_use]
pub fn query<P>(index: &AsteroidIndex<P>, distance: i32, mask: TierMask) -> TierAggregates<'_, P> {
    let Some((interval, entry)) = index.interval_at(i64::from(distance)) else {
        trace!(target: LOG_TARGET_QUERY, "distance {distance} outside indexed intervals");
        return TierAggregates::empty();
    };
    trace!(
        target: LOG_TARGET_QUERY,
        "distance {distance} -> [{}, {}) mask {:#x}",
        interval.start,
        interval.end,
        mask.bits()
    );
    TierAggregates {
        slots: entry.tiers(),
        remaining: mask.bits(),
    }
}

impl<P> AsteroidIndex<P> {
    /// See [`query`].
    #[must_use]
    pub fn query(&self, distance: i32, mask: TierMask) -> TierAggregates<'_, P> {
        query(self, distance, mask)
    }
}
