//! Open-world board generation with a connectivity guarantee.
//! Random layouts are validated by flood fill and retried a bounded number of times
//! before a fixed fallback pattern takes over.

use std::iter::repeat_n;

use tracing::{debug, info};

use super::grid::{ENTRY, MAX_BOARD_SIZE, MIN_BOARD_SIZE, TerrainGrid};
use crate::error::GridError;
use crate::rng::{RandomSource, shuffle};
use crate::rules::Rules;
use crate::types::TerrainKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedWorld {
    pub grid: TerrainGrid,
    /// Random layouts tried, including the accepted one.
    pub attempts: u32,
    pub used_fallback: bool,
}

pub struct WorldGenerator<'a> {
    rng: &'a mut dyn RandomSource,
    rules: &'a Rules,
}

impl<'a> WorldGenerator<'a> {
    pub fn new(rng: &'a mut dyn RandomSource, rules: &'a Rules) -> Self {
        Self { rng, rules }
    }

    pub fn generate(&mut self, size: usize) -> Result<TerrainGrid, GridError> {
        self.generate_with_report(size).map(|world| world.grid)
    }

    pub fn generate_with_report(&mut self, size: usize) -> Result<GeneratedWorld, GridError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(GridError::InvalidSize(size));
        }

        let limit = self.rules.generation_attempts;
        for attempt in 1..=limit {
            let grid = self.random_layout(size);
            let reachable = grid.reachable_count(ENTRY);
            let accessible = grid.accessible_count();
            if reachable == accessible {
                debug!(size, attempt, accessible, "accepted generated layout");
                return Ok(GeneratedWorld { grid, attempts: attempt, used_fallback: false });
            }
            debug!(size, attempt, reachable, accessible, "rejected disconnected layout");
        }

        info!(size, attempts = limit, "falling back to fixed layout");
        Ok(GeneratedWorld { grid: fallback_layout(size), attempts: limit, used_fallback: true })
    }

    fn random_layout(&mut self, size: usize) -> TerrainGrid {
        let mut terrain = terrain_pool(size * size, self.rules);
        shuffle(self.rng, &mut terrain);

        terrain[0] = TerrainKind::Open;
        for neighbor in [1, size] {
            if terrain[neighbor] == TerrainKind::Blocked {
                terrain[neighbor] = TerrainKind::Open;
            }
        }
        TerrainGrid::from_terrain(size, size, &terrain)
    }
}

/// Exact terrain counts for a board of `total` cells, unshuffled.
pub(super) fn terrain_pool(total: usize, rules: &Rules) -> Vec<TerrainKind> {
    let blocked = ((total as f64 * rules.blocked_ratio).round() as usize).max(1).min(total);
    let market = ((total as f64 * rules.market_ratio).round() as usize).min(total - blocked);
    let open = total - blocked - market;

    let mut terrain = Vec::with_capacity(total);
    terrain.extend(repeat_n(TerrainKind::Blocked, blocked));
    terrain.extend(repeat_n(TerrainKind::Market, market));
    terrain.extend(repeat_n(TerrainKind::Open, open));
    terrain
}

/// Border ring is always walkable and every interior band reaches it, so the
/// layout is connected without validation.
pub(super) fn fallback_layout(size: usize) -> TerrainGrid {
    let mut terrain = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let border = row == 0 || col == 0 || row == size - 1 || col == size - 1;
            let sum = row + col;
            let kind = if border {
                if sum % 3 == 0 { TerrainKind::Market } else { TerrainKind::Open }
            } else if sum % 7 == 0 {
                TerrainKind::Blocked
            } else if sum % 4 == 0 {
                TerrainKind::Market
            } else {
                TerrainKind::Open
            };
            terrain.push(kind);
        }
    }
    terrain[0] = TerrainKind::Open;
    TerrainGrid::from_terrain(size, size, &terrain)
}
