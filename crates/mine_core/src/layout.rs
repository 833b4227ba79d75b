//! Mine geometry: the tile grid, the walkable floor area, the door and the
//! rail track.
//!
//! The map is `map_width_tiles × map_height_tiles`. A mine's available area is
//! centered on the map and is floor; everything else is wall. Entity positions
//! are percentages of the map (tile center / map size × 100).

use ahash::AHashSet;
use rand::Rng;

use crate::{Constants, MineDef, Position, RailKind, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineLayout {
    pub map_width: u32,
    pub map_height: u32,
    pub origin: Tile,
    pub width: u32,
    pub height: u32,
}

impl MineLayout {
    pub fn new(mine: &MineDef, constants: &Constants) -> Self {
        let map_width = constants.map_width_tiles.max(1);
        let map_height = constants.map_height_tiles.max(1);
        let width = mine.available_area.width.clamp(1, map_width);
        let height = mine.available_area.height.clamp(1, map_height);
        Self {
            map_width,
            map_height,
            origin: Tile {
                x: (map_width - width) / 2,
                y: (map_height - height) / 2,
            },
            width,
            height,
        }
    }

    pub fn is_floor(&self, tile: Tile) -> bool {
        tile.x >= self.origin.x
            && tile.x < self.origin.x + self.width
            && tile.y >= self.origin.y
            && tile.y < self.origin.y + self.height
    }

    /// Top-center floor tile. Miners drop off their haul here.
    pub fn door(&self) -> Tile {
        Tile {
            x: self.origin.x + self.width / 2,
            y: self.origin.y,
        }
    }

    pub fn base_position(&self) -> Position {
        self.to_position(self.door())
    }

    pub fn to_position(&self, tile: Tile) -> Position {
        Position {
            x: (f64::from(tile.x) + 0.5) / f64::from(self.map_width) * 100.0,
            y: (f64::from(tile.y) + 0.5) / f64::from(self.map_height) * 100.0,
        }
    }

    /// Every floor tile, row-major.
    pub fn floor_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (self.origin.y..self.origin.y + self.height).flat_map(move |y| {
            (self.origin.x..self.origin.x + self.width).map(move |x| Tile { x, y })
        })
    }

    /// Floor tiles free for ore placement: not the door, not under a rail.
    pub fn ore_tiles(&self, rails: &[(Tile, RailKind)]) -> Vec<Tile> {
        let blocked: AHashSet<Tile> = rails
            .iter()
            .map(|(tile, _)| *tile)
            .chain(std::iter::once(self.door()))
            .collect();
        self.floor_tiles()
            .filter(|tile| !blocked.contains(tile))
            .collect()
    }

    pub fn random_floor_position(&self, rng: &mut impl Rng) -> Position {
        let tile = Tile {
            x: rng.gen_range(self.origin.x..self.origin.x + self.width),
            y: rng.gen_range(self.origin.y..self.origin.y + self.height),
        };
        self.to_position(tile)
    }

    /// T-shaped track: a vertical run from the door down two thirds of the
    /// area, a horizontal run across the full width at that depth, and a branch
    /// dropping one third of the height from a random point on the horizontal run.
    pub fn generate_rails(&self, rng: &mut impl Rng) -> Vec<(Tile, RailKind)> {
        let door = self.door();
        let bottom = self.origin.y + self.height - 1;
        let cross_y = (door.y + self.height * 2 / 3).min(bottom);
        let mut rails = Vec::new();

        for y in door.y..cross_y {
            rails.push((Tile { x: door.x, y }, RailKind::Vertical));
        }

        let branch_x = rng.gen_range(self.origin.x..self.origin.x + self.width);
        for x in self.origin.x..self.origin.x + self.width {
            let kind = if x == door.x {
                RailKind::Junction
            } else if x == branch_x {
                RailKind::Branch
            } else if x == self.origin.x || x == self.origin.x + self.width - 1 {
                RailKind::End
            } else {
                RailKind::Horizontal
            };
            rails.push((Tile { x, y: cross_y }, kind));
        }

        let branch_end = (cross_y + self.height / 3).min(bottom);
        for y in cross_y + 1..=branch_end {
            let kind = if y == branch_end {
                RailKind::End
            } else {
                RailKind::Vertical
            };
            rails.push((Tile { x: branch_x, y }, kind));
        }

        rails
    }
}
