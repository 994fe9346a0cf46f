//! Map construction for tests and benchmarks

use grid::BitGrid;
use unit::map::{Cell, CellRect};

use crate::map::{AreaId, Edifice, FactionId, FactionRelation, LordId, Map, MapId, Terrain};

pub struct MapBuilder {
    map: Map,
}

impl MapBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            map: Map::new(MapId(0), width, height),
        }
    }

    /// One char per cell, the first line is the northmost row.
    ///  - `.` soil
    ///  - `#` wall
    ///  - `R` natural rock
    ///  - `X` chasm
    ///  - `D` door
    ///  - `F` fence
    ///  - `~` shallow water
    ///  - `W` deep water
    ///  - `M` mud
    ///
    /// Panics on ragged rows or unknown chars
    pub fn from_ascii(ascii: &str) -> Self {
        let rows: Vec<&str> = ascii
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        assert!(
            rows.iter().all(|r| r.chars().count() == width),
            "ragged map"
        );

        let mut builder = Self::new(width as u16, height as u16);
        for (i, row) in rows.iter().enumerate() {
            let z = (height - 1 - i) as i32;
            for (x, c) in row.chars().enumerate() {
                let cell = Cell::new(x as i32, z);
                let rect = CellRect::single(cell);
                builder = match c {
                    '.' => builder,
                    '#' => builder.building(rect, Edifice::wall(300)),
                    'R' => builder.building(rect, Edifice::natural_wall(1000)),
                    'X' => builder.terrain(cell, Terrain::chasm()),
                    'D' => builder.building(rect, Edifice::door(100, 45)),
                    'F' => builder.building(rect, Edifice::fence(80)),
                    '~' => builder.terrain(cell, Terrain::shallow_water()),
                    'W' => builder.terrain(cell, Terrain::deep_water()),
                    'M' => builder.terrain(cell, Terrain::mud()),
                    _ => panic!("unknown map char {:?}", c),
                };
            }
        }

        builder
    }

    pub fn terrain(mut self, cell: Cell, terrain: Terrain) -> Self {
        self.map.set_terrain(cell, terrain);
        self
    }

    pub fn terrain_cost(self, cell: Cell, cost: u32) -> Self {
        self.terrain(cell, Terrain::with_cost(cost))
    }

    pub fn building(mut self, rect: CellRect, edifice: Edifice) -> Self {
        self.map.spawn_building(rect, edifice);
        self
    }

    pub fn wall(self, cell: Cell) -> Self {
        self.building(CellRect::single(cell), Edifice::wall(300))
    }

    pub fn fog(mut self, cell: Cell) -> Self {
        self.map.set_fogged(cell, true);
        self
    }

    pub fn roof(mut self, rect: CellRect) -> Self {
        for cell in rect.cells() {
            self.map.set_roofed(cell, true);
        }
        self
    }

    pub fn glow(mut self, cell: Cell, glow: f32) -> Self {
        self.map.set_glow(cell, glow);
        self
    }

    pub fn area(mut self, area: AreaId, cell: Cell) -> Self {
        self.map.set_area_cell(area, cell, true);
        self
    }

    pub fn lord_walk_grid(mut self, lord: LordId, rect: CellRect) -> Self {
        let indices = *self.map.indices();
        let mut grid = BitGrid::new(indices.dims());
        for cell in rect.cells() {
            if let Some(idx) = indices.try_index_of(cell) {
                grid.set(idx, true);
            }
        }
        self.map.set_lord_walk_grid(lord, grid);
        self
    }

    pub fn player_faction(mut self, faction: FactionId) -> Self {
        self.map.set_player_faction(faction);
        self
    }

    pub fn relation(mut self, a: FactionId, b: FactionId, relation: FactionRelation) -> Self {
        self.map.set_relation(a, b, relation);
        self
    }

    pub fn build(self) -> Map {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_rows_run_north_to_south() {
        let map = MapBuilder::from_ascii(
            "
            #..
            ..~
            ",
        )
        .build();

        let indices = map.indices();
        assert_eq!((indices.width(), indices.height()), (3, 2));
        assert!(map.is_impassable(indices.index_of(Cell::new(0, 1))));
        assert!(map.terrain(indices.index_of(Cell::new(2, 0))).water);
    }
}
