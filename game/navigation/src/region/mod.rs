//! Partitions the standable cells of a map into small bounded regions, linked into a graph
//! and grouped into districts and rooms. Used to reject unreachable requests before searching

use ahash::AHashMap;
use grid::{BitGrid, CellGrid};
use misc::*;
use petgraph::graphmap::UnGraphMap;
use unit::map::{Cell, CellIndices, CellRect, Direction};

use crate::map::{EdificeKind, Map};

pub use district::{District, DistrictId, Room, RoomId};

mod district;
mod reach;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u32);

slog_value_debug!(RegionId);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Normal,
    Fence,
    /// A single door cell
    Portal,
}

impl RegionKind {
    /// None if the cell can't be stood in
    pub fn of_cell(map: &Map, idx: usize) -> Option<Self> {
        if map.is_impassable(idx) {
            return None;
        }

        Some(match map.edifice(idx).map(|e| e.kind) {
            Some(EdificeKind::Door(_)) => RegionKind::Portal,
            Some(EdificeKind::Fence) => RegionKind::Fence,
            _ => RegionKind::Normal,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    kind: RegionKind,
    /// Sorted
    cells: Vec<usize>,
    extents: CellRect,
    touches_map_edge: bool,
    door: Option<Cell>,
    district: Option<DistrictId>,
    /// Cleared when a cell in or beside it changes, until the next rebuild
    valid: bool,
}

impl Region {
    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn extents(&self) -> CellRect {
        self.extents
    }

    pub fn touches_map_edge(&self) -> bool {
        self.touches_map_edge
    }

    /// The door cell if this is a portal
    pub fn door(&self) -> Option<Cell> {
        self.door
    }

    pub fn district(&self) -> Option<DistrictId> {
        self.district
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

pub struct RegionGrid {
    indices: CellIndices,
    region_size: i32,
    cell_regions: CellGrid<Option<RegionId>>,
    regions: AHashMap<RegionId, Region>,
    graph: UnGraphMap<RegionId, ()>,
    districts: Vec<District>,
    rooms: Vec<Room>,
    /// Cells changed since the last rebuild
    dirty: Vec<usize>,
    next_id: u32,
}

type ReusableRegions = AHashMap<usize, (RegionId, RegionKind, Vec<usize>)>;

impl RegionGrid {
    pub fn new(map: &Map, region_size: u16) -> Self {
        let indices = *map.indices();
        let mut grid = Self {
            indices,
            region_size: i32::from(region_size.max(1)),
            cell_regions: CellGrid::new(indices.dims()),
            regions: AHashMap::new(),
            graph: UnGraphMap::new(),
            districts: Vec::new(),
            rooms: Vec::new(),
            dirty: Vec::new(),
            next_id: 0,
        };

        let all = (0..indices.num_grid_cells()).collect_vec();
        let created = grid.fill(map, &all, &ReusableRegions::new());
        grid.link(&created);
        grid.rebuild_districts();

        debug!("built region grid";
            "regions" => grid.regions.len(),
            "districts" => grid.districts.len(),
            "rooms" => grid.rooms.len()
        );
        grid
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn region_at(&self, cell: Cell) -> Option<&Region> {
        let idx = self.indices.try_index_of(cell)?;
        self.cell_regions[idx].and_then(|id| self.regions.get(&id))
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.values()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Regions sharing an edge with the given one
    pub fn neighbours(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        self.graph.neighbors(id)
    }

    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.districts.get(id.index())
    }

    pub fn district_at(&self, cell: Cell) -> Option<&District> {
        self.region_at(cell)
            .and_then(|r| r.district)
            .and_then(|d| self.district(d))
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.index())
    }

    pub fn room_at(&self, cell: Cell) -> Option<&Room> {
        self.district_at(cell).and_then(|d| self.room(d.room()))
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Invalidates every region in or touching the rect
    pub fn mark_dirty(&mut self, rect: CellRect) {
        let rect = match rect.expanded_by(1).clipped_to(&self.indices) {
            Some(r) => r,
            None => {
                warn!("ignoring out of bounds region change"; "rect" => rect);
                return;
            }
        };

        for cell in rect.cells() {
            let idx = self.indices.index_of(cell);
            self.dirty.push(idx);
            if let Some(id) = self.cell_regions[idx] {
                if let Some(region) = self.regions.get_mut(&id) {
                    region.valid = false;
                }
            }
        }
    }

    /// Refills invalidated regions, keeping the id of any whose cells didn't change. Returns
    /// false if nothing was dirty
    pub fn rebuild_dirty(&mut self, map: &Map) -> bool {
        if self.dirty.is_empty() {
            return false;
        }

        let mut candidates = std::mem::take(&mut self.dirty);
        let invalid = self
            .regions
            .values()
            .filter(|r| !r.valid)
            .map(|r| r.id)
            .collect_vec();

        let mut reusable = ReusableRegions::new();
        for id in &invalid {
            let region = some_or_continue!(self.regions.remove(id));
            self.graph.remove_node(*id);
            for &idx in &region.cells {
                self.cell_regions[idx] = None;
            }

            candidates.extend_from_slice(&region.cells);
            reusable.insert(region.cells[0], (region.id, region.kind, region.cells));
        }

        candidates.sort_unstable();
        candidates.dedup();

        let created = self.fill(map, &candidates, &reusable);
        self.link(&created);
        self.rebuild_districts();

        let kept = created
            .iter()
            .filter(|id| reusable.values().any(|(old, _, _)| old == *id))
            .count();
        debug!("rebuilt dirty regions";
            "invalidated" => invalid.len(),
            "created" => created.len(),
            "kept" => kept,
            "cells" => candidates.len()
        );
        true
    }

    /// Resets the open roof count of the district containing the cell
    pub fn roof_changed(&mut self, cell: Cell) {
        let district = self.region_at(cell).and_then(|r| r.district);
        if let Some(district) = district.and_then(|d| self.districts.get_mut(d.index())) {
            district.invalidate_roof_cache();
        }
    }

    /// Flood fills every unassigned candidate into new regions
    fn fill(&mut self, map: &Map, candidates: &[usize], reusable: &ReusableRegions) -> Vec<RegionId> {
        let mut visited = BitGrid::new(self.indices.dims());
        let mut queue = Vec::new();
        let mut created = Vec::new();

        for &start in candidates {
            if visited.get(start) || self.cell_regions[start].is_some() {
                continue;
            }

            let kind = some_or_continue!(RegionKind::of_cell(map, start));
            visited.set(start, true);

            let mut cells = vec![start];
            if kind != RegionKind::Portal {
                let chunk = self.chunk_of(self.indices.index_to_cell(start));
                queue.clear();
                queue.push(start);

                while let Some(idx) = queue.pop() {
                    let cell = self.indices.index_to_cell(idx);
                    for dir in Direction::CARDINALS {
                        let n = cell.neighbour(dir);
                        if self.chunk_of(n) != chunk {
                            continue;
                        }

                        let n_idx = some_or_continue!(self.indices.try_index_of(n));
                        if visited.get(n_idx)
                            || self.cell_regions[n_idx].is_some()
                            || RegionKind::of_cell(map, n_idx) != Some(kind)
                        {
                            continue;
                        }

                        visited.set(n_idx, true);
                        cells.push(n_idx);
                        queue.push(n_idx);
                    }
                }
            }

            cells.sort_unstable();
            let id = match reusable.get(&cells[0]) {
                Some((old, old_kind, old_cells)) if *old_kind == kind && *old_cells == cells => *old,
                _ => self.allocate_id(),
            };

            let region = self.make_region(id, kind, cells);
            for &idx in &region.cells {
                self.cell_regions[idx] = Some(id);
            }
            self.graph.add_node(id);
            self.regions.insert(id, region);
            created.push(id);
        }

        created
    }

    fn make_region(&self, id: RegionId, kind: RegionKind, cells: Vec<usize>) -> Region {
        let mut touches_map_edge = false;
        let (mut min, mut max) = {
            let first = self.indices.index_to_cell(cells[0]);
            (first, first)
        };

        for &idx in &cells {
            let cell = self.indices.index_to_cell(idx);
            min = Cell::new(min.x.min(cell.x), min.z.min(cell.z));
            max = Cell::new(max.x.max(cell.x), max.z.max(cell.z));
            touches_map_edge |= self.indices.is_on_edge(cell);
        }

        let door = if kind == RegionKind::Portal {
            Some(self.indices.index_to_cell(cells[0]))
        } else {
            None
        };

        Region {
            id,
            kind,
            cells,
            extents: CellRect::new(min, max),
            touches_map_edge,
            door,
            district: None,
            valid: true,
        }
    }

    /// Adds edges from the given regions to every region they share a side with
    fn link(&mut self, regions: &[RegionId]) {
        for id in regions {
            let region = some_or_continue!(self.regions.get(id));
            for &idx in &region.cells {
                let cell = self.indices.index_to_cell(idx);
                for dir in Direction::CARDINALS {
                    let n_idx = some_or_continue!(self.indices.try_index_of(cell.neighbour(dir)));
                    if let Some(other) = self.cell_regions[n_idx] {
                        if other != *id {
                            self.graph.add_edge(*id, other, ());
                        }
                    }
                }
            }
        }
    }

    fn chunk_of(&self, cell: Cell) -> (i32, i32) {
        (
            cell.x.div_euclid(self.region_size),
            cell.z.div_euclid(self.region_size),
        )
    }

    fn allocate_id(&mut self) -> RegionId {
        let id = RegionId(self.next_id);
        self.next_id += 1;
        id
    }
}
