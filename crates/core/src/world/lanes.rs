//! Fixed 8x8 three-lane board: two wall columns, a nexus row at each end,
//! and randomly rolled terrain everywhere else.

use super::grid::TerrainGrid;
use crate::rng::RandomSource;
use crate::types::{Pos, TerrainKind};

pub const LANE_BOARD_SIZE: usize = 8;
pub const WALL_COLUMNS: [usize; 2] = [2, 5];
pub const LANE_COUNT: usize = 3;

pub const HERO_NEXUS_ROW: i32 = LANE_BOARD_SIZE as i32 - 1;
pub const MONSTER_NEXUS_ROW: i32 = 0;
const HERO_SPAWN_COLUMNS: [i32; LANE_COUNT] = [0, 3, 6];
const MONSTER_SPAWN_COLUMNS: [i32; LANE_COUNT] = [1, 4, 7];

/// Cumulative thresholds for rolled cells. Anything above the last one is an obstacle.
const ROLL_TABLE: [(f64, TerrainKind); 4] = [
    (0.20, TerrainKind::Open),
    (0.40, TerrainKind::BushBoost),
    (0.60, TerrainKind::CaveBoost),
    (0.80, TerrainKind::StrengthBoost),
];

pub fn generate_lane_board(rng: &mut dyn RandomSource) -> TerrainGrid {
    let mut terrain = Vec::with_capacity(LANE_BOARD_SIZE * LANE_BOARD_SIZE);
    for row in 0..LANE_BOARD_SIZE {
        for col in 0..LANE_BOARD_SIZE {
            let kind = if WALL_COLUMNS.contains(&col) {
                TerrainKind::Blocked
            } else if row == 0 || row == LANE_BOARD_SIZE - 1 {
                TerrainKind::Nexus
            } else {
                roll_terrain(rng.next_f64())
            };
            terrain.push(kind);
        }
    }
    TerrainGrid::from_terrain(LANE_BOARD_SIZE, LANE_BOARD_SIZE, &terrain)
}

fn roll_terrain(roll: f64) -> TerrainKind {
    ROLL_TABLE
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .map_or(TerrainKind::DestructibleObstacle, |&(_, kind)| kind)
}

/// Lane index for a board column. Wall columns belong to no lane.
pub fn lane_of_column(col: usize) -> Option<usize> {
    match col {
        0 | 1 => Some(0),
        3 | 4 => Some(1),
        6 | 7 => Some(2),
        _ => None,
    }
}

pub fn hero_spawn(lane: usize) -> Option<Pos> {
    HERO_SPAWN_COLUMNS.get(lane).map(|&x| Pos { y: HERO_NEXUS_ROW, x })
}

pub fn monster_spawn(lane: usize) -> Option<Pos> {
    MONSTER_SPAWN_COLUMNS.get(lane).map(|&x| Pos { y: MONSTER_NEXUS_ROW, x })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{FixedRolls, GameRng};

    #[test]
    fn walls_and_nexus_rows_hold_for_every_seed() {
        for seed in 0..256 {
            let mut rng = GameRng::seed_from_u64(seed);
            let board = generate_lane_board(&mut rng);
            for pos in board.positions() {
                let terrain = board.terrain_at(pos).unwrap();
                let col = pos.x as usize;
                let wall = WALL_COLUMNS.contains(&col);
                assert_eq!(terrain == TerrainKind::Blocked, wall, "seed={seed} pos={pos:?}");
                let nexus_row = pos.y == 0 || pos.y == 7;
                assert_eq!(terrain == TerrainKind::Nexus, nexus_row && !wall);
                assert_ne!(terrain, TerrainKind::Market);
            }
        }
    }

    #[test]
    fn roll_table_boundaries() {
        assert_eq!(roll_terrain(0.0), TerrainKind::Open);
        assert_eq!(roll_terrain(0.19), TerrainKind::Open);
        assert_eq!(roll_terrain(0.20), TerrainKind::BushBoost);
        assert_eq!(roll_terrain(0.45), TerrainKind::CaveBoost);
        assert_eq!(roll_terrain(0.79), TerrainKind::StrengthBoost);
        assert_eq!(roll_terrain(0.80), TerrainKind::DestructibleObstacle);
    }

    #[test]
    fn high_rolls_fill_the_interior_with_obstacles_that_can_be_cleared() {
        let mut rolls = FixedRolls::new(0.9);
        let mut board = generate_lane_board(&mut rolls);
        let pos = Pos { y: 3, x: 0 };
        assert_eq!(board.terrain_at(pos), Ok(TerrainKind::DestructibleObstacle));
        assert!(!board.is_accessible(pos));
        assert_eq!(board.destroy_obstacle(pos), Ok(true));
        assert!(board.is_accessible(pos));
    }

    #[test]
    fn spawns_sit_in_their_own_lane() {
        for lane in 0..LANE_COUNT {
            let hero = hero_spawn(lane).unwrap();
            let monster = monster_spawn(lane).unwrap();
            assert_eq!(hero.y, 7);
            assert_eq!(monster.y, 0);
            assert_eq!(lane_of_column(hero.x as usize), Some(lane));
            assert_eq!(lane_of_column(monster.x as usize), Some(lane));
        }
        assert_eq!(hero_spawn(3), None);
        assert_eq!(lane_of_column(2), None);
        assert_eq!(lane_of_column(5), None);
    }

    #[test]
    fn boost_cells_name_their_stat() {
        use crate::types::StatKind;
        assert_eq!(TerrainKind::BushBoost.boosted_stat(), Some(StatKind::Dexterity));
        assert_eq!(TerrainKind::CaveBoost.boosted_stat(), Some(StatKind::Agility));
        assert_eq!(TerrainKind::StrengthBoost.boosted_stat(), Some(StatKind::Strength));
        assert_eq!(TerrainKind::Nexus.boosted_stat(), None);
    }
}
