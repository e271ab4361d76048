//! Terrain grid, walkability and single-step greedy movement.

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

const BORDER_WATER_CHANCE: f64 = 0.4;
const INTERIOR_ROCK_CHANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Grass,
    Water,
    Rock,
}

impl Terrain {
    fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' | 'G' => Some(Terrain::Grass),
            '~' | 'W' => Some(Terrain::Water),
            '#' | 'R' => Some(Terrain::Rock),
            _ => None,
        }
    }
}

/// Square terrain map. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldGrid {
    size: i32,
    tiles: Vec<Terrain>,
}

impl WorldGrid {
    pub fn filled(size: i32, terrain: Terrain) -> Self {
        let size = size.max(1);
        Self {
            size,
            tiles: vec![terrain; (size * size) as usize],
        }
    }

    /// Grass everywhere, water on the border with p=0.4, rock in the
    /// interior with p=0.1. Every cell draws independently, row-major.
    pub fn generate(size: i32, rng: &mut dyn RandomSource) -> Self {
        let size = size.max(3);
        let mut tiles = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let border = x == 0 || y == 0 || x == size - 1 || y == size - 1;
                let terrain = if border {
                    if rng.chance(BORDER_WATER_CHANCE) {
                        Terrain::Water
                    } else {
                        Terrain::Grass
                    }
                } else if rng.chance(INTERIOR_ROCK_CHANCE) {
                    Terrain::Rock
                } else {
                    Terrain::Grass
                };
                tiles.push(terrain);
            }
        }
        Self { size, tiles }
    }

    /// Builds a grid from text rows (`.` grass, `~` water, `#` rock).
    /// Rows must be square; unknown glyphs read as grass.
    pub fn from_rows(rows: &[&str]) -> Self {
        let side = rows.len().max(1);
        let mut tiles = Vec::with_capacity(side * side);
        for row in rows {
            let mut cells: Vec<Terrain> = row
                .chars()
                .map(|glyph| Terrain::from_glyph(glyph).unwrap_or(Terrain::Grass))
                .collect();
            cells.resize(side, Terrain::Grass);
            tiles.extend(cells);
        }
        tiles.resize(side * side, Terrain::Grass);
        Self {
            size: side as i32,
            tiles,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.size && pos.y < self.size
    }

    pub fn terrain(&self, pos: Position) -> Option<Terrain> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.tiles.get((pos.y * self.size + pos.x) as usize).copied()
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        matches!(self.terrain(pos), Some(Terrain::Grass | Terrain::Rock))
    }

    pub fn center(&self) -> Position {
        Position::new(self.size / 2, self.size / 2)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| Position::new(x, y)))
    }

    pub fn rows(&self) -> Vec<Vec<Terrain>> {
        self.tiles
            .chunks(self.size as usize)
            .map(|row| row.to_vec())
            .collect()
    }
}

/// One greedy step toward `target`. Tries a unit step on each axis; takes
/// the diagonal when both axis steps and the diagonal cell are walkable,
/// otherwise the axis step that closes the larger gap. Returns the new
/// position, which equals `from` when fully blocked.
pub fn move_towards(grid: &WorldGrid, from: Position, target: Position) -> Position {
    if from == target {
        return from;
    }
    let dx = target.x - from.x;
    let dy = target.y - from.y;
    let sx = dx.signum();
    let sy = dy.signum();

    let horizontal = (sx != 0)
        .then(|| from.offset(sx, 0))
        .filter(|pos| grid.is_walkable(*pos));
    let vertical = (sy != 0)
        .then(|| from.offset(0, sy))
        .filter(|pos| grid.is_walkable(*pos));

    match (horizontal, vertical) {
        (Some(h), Some(v)) => {
            let diagonal = from.offset(sx, sy);
            if grid.is_walkable(diagonal) {
                diagonal
            } else if dy.abs() > dx.abs() {
                v
            } else {
                h
            }
        }
        (Some(h), None) => h,
        (None, Some(v)) => v,
        (None, None) => from,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;

    #[test]
    fn border_water_and_interior_rock_follow_rolls() {
        // every roll below both thresholds: water border, rock interior
        let mut low = ScriptedRolls::constant(0.05);
        let grid = WorldGrid::generate(5, &mut low);
        assert_eq!(grid.terrain(Position::new(0, 0)), Some(Terrain::Water));
        assert_eq!(grid.terrain(Position::new(2, 2)), Some(Terrain::Rock));

        let mut high = ScriptedRolls::constant(0.95);
        let grid = WorldGrid::generate(5, &mut high);
        assert!(grid.positions().all(|p| grid.terrain(p) == Some(Terrain::Grass)));
    }

    #[test]
    fn walkability_excludes_water_and_out_of_bounds() {
        let grid = WorldGrid::from_rows(&["~.#", "...", "..."]);
        assert!(!grid.is_walkable(Position::new(0, 0)));
        assert!(grid.is_walkable(Position::new(1, 0)));
        assert!(grid.is_walkable(Position::new(2, 0)));
        assert!(!grid.is_walkable(Position::new(-1, 0)));
        assert!(!grid.is_walkable(Position::new(3, 1)));
    }

    #[test]
    fn empty_rows_give_a_single_grass_tile() {
        let grid = WorldGrid::from_rows(&[]);
        assert_eq!(grid.size(), 1);
        assert_eq!(grid.rows(), vec![vec![Terrain::Grass]]);
        assert_eq!(grid.positions().count(), 1);
    }

    #[test]
    fn steps_diagonally_when_clear() {
        let grid = WorldGrid::filled(6, Terrain::Grass);
        let next = move_towards(&grid, Position::new(1, 1), Position::new(4, 3));
        assert_eq!(next, Position::new(2, 2));
    }

    #[test]
    fn falls_back_to_axis_step_when_diagonal_is_water() {
        let grid = WorldGrid::from_rows(&["....", "....", "..~.", "...."]);
        let next = move_towards(&grid, Position::new(1, 1), Position::new(3, 2));
        assert_eq!(next, Position::new(2, 1));
    }

    #[test]
    fn stalls_against_a_water_wall() {
        let grid = WorldGrid::from_rows(&[".~.", ".~.", ".~."]);
        let start = Position::new(0, 1);
        let next = move_towards(&grid, start, Position::new(2, 1));
        assert_eq!(next, start);
    }

    #[test]
    fn arrival_is_a_fixed_point() {
        let grid = WorldGrid::filled(3, Terrain::Grass);
        let here = Position::new(1, 1);
        assert_eq!(move_towards(&grid, here, here), here);
    }
}
