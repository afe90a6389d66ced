//! Sweep decomposition of overlapping recipe ranges into canonical intervals.
//!
//! Every recipe contributes a start event at `min_distance` and an end event at
//! `max_distance + 1`. Events are processed in position order and all events
//! sharing a position are applied together, so each emitted interval is the
//! maximal run of distances over which the active recipe set stays constant.
//! Cost is `O(n log n)` in the number of recipes and does not depend on how
//! far apart the distances are.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::SWEEP_CURSOR_SENTINEL;
use crate::recipe::{Recipe, RecipeId};

/// Half-open distance range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalInterval {
    pub start: i64,
    pub end: i64,
}

impl CanonicalInterval {
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, distance: i64) -> bool {
        self.start <= distance && distance < self.end
    }

    /// Number of integer distances covered.
    #[must_use]
    pub const fn width(&self) -> u64 {
        self.end.abs_diff(self.start)
    }
}

/// One canonical interval with a snapshot of the recipes active over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpan {
    pub interval: CanonicalInterval,
    /// Active recipes in ascending id order.
    pub active: Vec<RecipeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SweepEvent {
    position: i64,
    kind: EventKind,
    id: RecipeId,
}

fn collect_events<P>(recipes: &[Recipe<P>]) -> Vec<SweepEvent> {
    let mut events = Vec::with_capacity(recipes.len() * 2);
    for (idx, recipe) in recipes.iter().enumerate() {
        let id = RecipeId(idx);
        events.push(SweepEvent {
            position: recipe.start_position(),
            kind: EventKind::Start,
            id,
        });
        events.push(SweepEvent {
            position: recipe.end_position(),
            kind: EventKind::End,
            id,
        });
    }
    events.sort_unstable();
    events
}

/// Decompose the recipe ranges into canonical intervals.
///
/// Recipes are expected to be validated already; a recipe whose range is
/// inverted would be removed before it is added and silently vanish.
#[must_use]
pub fn sweep<P>(recipes: &[Recipe<P>]) -> Vec<IntervalSpan> {
    let events = collect_events(recipes);
    let mut spans = Vec::new();
    let mut active: BTreeSet<RecipeId> = BTreeSet::new();
    let mut cursor = SWEEP_CURSOR_SENTINEL;

    let mut batch_start = 0;
    while batch_start < events.len() {
        let position = events[batch_start].position;
        let batch_end = events[batch_start..]
            .iter()
            .position(|event| event.position != position)
            .map_or(events.len(), |offset| batch_start + offset);

        if position > cursor {
            if !active.is_empty() {
                spans.push(IntervalSpan {
                    interval: CanonicalInterval::new(cursor, position),
                    active: active.iter().copied().collect(),
                });
            }
            cursor = position;
        }

        for event in &events[batch_start..batch_end] {
            match event.kind {
                EventKind::End => {
                    active.remove(&event.id);
                }
                EventKind::Start => {
                    active.insert(event.id);
                }
            }
        }
        batch_start = batch_end;
    }

    debug_assert!(active.is_empty(), "every start event has a matching end");
    spans
}
