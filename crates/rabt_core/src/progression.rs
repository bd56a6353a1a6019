//! Campaign progression across tiers.
//!
//! Three tiers of three levels each, played in order. (Expert, 3) is last.

use strum::IntoEnumIterator;
use tracing::instrument;

use crate::types::{LevelId, MAX_LEVEL_INDEX, MIN_LEVEL_INDEX, Tier};

/// Returns the level that follows `level`, or `None` once the campaign is finished.
#[instrument]
pub fn next_level(level: LevelId) -> Option<LevelId> {
    if level.index() < MAX_LEVEL_INDEX {
        return LevelId::new(level.tier(), level.index() + 1).ok();
    }
    let tier = level.tier().next()?;
    LevelId::new(tier, MIN_LEVEL_INDEX).ok()
}

/// All levels of the campaign in play order.
pub fn campaign() -> impl Iterator<Item = LevelId> {
    Tier::iter().flat_map(|tier| {
        (MIN_LEVEL_INDEX..=MAX_LEVEL_INDEX).filter_map(move |index| LevelId::new(tier, index).ok())
    })
}
