//! Board construction and spatial queries.
//! This module exists to keep terrain layout separate from combat and party state.

pub mod generator;
pub mod grid;
pub mod lanes;

pub use generator::{GeneratedWorld, WorldGenerator};
pub use grid::{Cell, ENTRY, MAX_BOARD_SIZE, MIN_BOARD_SIZE, TerrainGrid};
pub use lanes::{LANE_BOARD_SIZE, generate_lane_board};
