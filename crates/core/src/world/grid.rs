//! Grid and cell primitives shared by world generation, movement, and the lane board.

use std::collections::VecDeque;

use xxhash_rust::xxh3::xxh3_64;

use crate::error::GridError;
use crate::types::{CharacterId, Direction, Pos, TerrainKind};

pub const MIN_BOARD_SIZE: usize = 4;
pub const MAX_BOARD_SIZE: usize = 20;

/// The party always enters the open world at the top-left corner.
pub const ENTRY: Pos = Pos::ORIGIN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub terrain: TerrainKind,
    pub hero: Option<CharacterId>,
    pub monster: Option<CharacterId>,
}

impl Cell {
    fn new(terrain: TerrainKind) -> Self {
        Self { terrain, hero: None, monster: None }
    }

    pub fn is_accessible(&self) -> bool {
        self.terrain.is_accessible()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl TerrainGrid {
    pub fn filled(width: usize, height: usize, terrain: TerrainKind) -> Self {
        Self { width, height, cells: vec![Cell::new(terrain); width * height] }
    }

    /// Builds a grid from row-major terrain. Missing trailing cells become `Open`.
    pub fn from_terrain(width: usize, height: usize, terrain: &[TerrainKind]) -> Self {
        debug_assert_eq!(terrain.len(), width * height);
        let mut grid = Self::filled(width, height, TerrainKind::Open);
        for (cell, &kind) in grid.cells.iter_mut().zip(terrain) {
            cell.terrain = kind;
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| (pos.y as usize) * self.width + (pos.x as usize))
    }

    pub fn cell(&self, pos: Pos) -> Result<&Cell, GridError> {
        self.index(pos).map(|index| &self.cells[index]).ok_or(GridError::OutOfBounds(pos))
    }

    pub fn cell_mut(&mut self, pos: Pos) -> Result<&mut Cell, GridError> {
        match self.index(pos) {
            Some(index) => Ok(&mut self.cells[index]),
            None => Err(GridError::OutOfBounds(pos)),
        }
    }

    pub fn terrain_at(&self, pos: Pos) -> Result<TerrainKind, GridError> {
        self.cell(pos).map(|cell| cell.terrain)
    }

    pub fn set_terrain(&mut self, pos: Pos, terrain: TerrainKind) -> Result<(), GridError> {
        self.cell_mut(pos)?.terrain = terrain;
        Ok(())
    }

    /// Out-of-bounds positions are never accessible.
    pub fn is_accessible(&self, pos: Pos) -> bool {
        self.cell(pos).is_ok_and(Cell::is_accessible)
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| Pos { y: y as i32, x: x as i32 }))
    }

    /// Orthogonal neighbours that lie on the board.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |direction| pos.step(direction))
            .filter(move |next| self.in_bounds(*next))
    }

    pub fn accessible_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_accessible()).count()
    }

    /// Breadth-first fill over accessible cells. Returns a row-major reachability mask.
    pub fn reachable_mask(&self, start: Pos) -> Vec<bool> {
        let mut seen = vec![false; self.cells.len()];
        let Some(start_index) = self.index(start) else {
            return seen;
        };
        if !self.cells[start_index].is_accessible() {
            return seen;
        }

        seen[start_index] = true;
        let mut open = VecDeque::from([start]);
        while let Some(pos) = open.pop_front() {
            for next in self.neighbors(pos) {
                let Some(index) = self.index(next) else {
                    continue;
                };
                if seen[index] || !self.cells[index].is_accessible() {
                    continue;
                }
                seen[index] = true;
                open.push_back(next);
            }
        }
        seen
    }

    pub fn reachable_count(&self, start: Pos) -> usize {
        self.reachable_mask(start).into_iter().filter(|&reached| reached).count()
    }

    pub fn is_connected_from(&self, start: Pos) -> bool {
        self.reachable_count(start) == self.accessible_count()
    }

    /// Turns a destructible obstacle into open ground. Returns whether anything changed.
    pub fn destroy_obstacle(&mut self, pos: Pos) -> Result<bool, GridError> {
        let cell = self.cell_mut(pos)?;
        if cell.terrain != TerrainKind::DestructibleObstacle {
            return Ok(false);
        }
        cell.terrain = TerrainKind::Open;
        Ok(true)
    }

    pub fn place_hero(&mut self, pos: Pos, hero: Option<CharacterId>) -> Result<(), GridError> {
        self.cell_mut(pos)?.hero = hero;
        Ok(())
    }

    pub fn place_monster(
        &mut self,
        pos: Pos,
        monster: Option<CharacterId>,
    ) -> Result<(), GridError> {
        self.cell_mut(pos)?.monster = monster;
        Ok(())
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + self.cells.len());
        bytes.extend((self.width as u32).to_le_bytes());
        bytes.extend((self.height as u32).to_le_bytes());
        for cell in &self.cells {
            bytes.push(cell.terrain.code());
        }
        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}
