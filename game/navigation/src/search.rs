//! A* over the cell grid, reading costs from a finished grid job

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use grid::{BitGrid, CellGrid};
use misc::*;
use unit::map::{Cell, CellIndices, Direction};

use crate::connection::CellConnections;
use crate::cost::BuildingSource;
use crate::map_data::PathFinderMapData;
use crate::path::PawnPath;
use crate::request::Destination;
use crate::settings::PathingSettings;
use crate::traverse::TraverseParms;
use crate::IMPASSABLE;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NodeStatus {
    Unvisited,
    Open,
    Closed,
}

#[derive(Copy, Clone, Debug)]
struct CalcNode {
    g: u32,
    h: f32,
    f: f32,
    parent: usize,
    status: NodeStatus,
}

impl Default for CalcNode {
    fn default() -> Self {
        Self {
            g: 0,
            h: 0.0,
            f: 0.0,
            parent: 0,
            status: NodeStatus::Unvisited,
        }
    }
}

/// Contains allocations to reuse between searches. One per worker thread
#[derive(Default)]
pub struct SearchContext {
    nodes: Vec<CalcNode>,
    open: BinaryHeap<MinScored<f32, usize>>,
    /// Nodes to reset before the next search
    touched: Vec<usize>,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset_for(&mut self, cell_count: usize) {
        if self.nodes.len() != cell_count {
            self.nodes.clear();
            self.nodes.resize(cell_count, CalcNode::default());
            self.touched.clear();
        } else {
            for idx in self.touched.drain(..) {
                self.nodes[idx] = CalcNode::default();
            }
        }

        self.open.clear();
    }

    fn touch(&mut self, idx: usize) -> &mut CalcNode {
        let node = &mut self.nodes[idx];
        if node.status == NodeStatus::Unvisited {
            self.touched.push(idx);
        }
        node
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(PawnPath),
    NotFound,
    /// Gave up after expanding too many nodes
    Overflow,
}

/// A single search over costs already folded by a grid job
pub struct PathFinderJob<'a> {
    indices: CellIndices,
    settings: &'a PathingSettings,
    costs: &'a CellGrid<u32>,
    connections: &'a CellConnections,
    buildings: &'a BuildingSource,
    fences: &'a BitGrid,
    fences_are_walls: bool,
    expansion_limit: usize,
}

impl<'a> PathFinderJob<'a> {
    pub fn new(
        data: &'a PathFinderMapData,
        costs: &'a CellGrid<u32>,
        parms: &TraverseParms,
    ) -> Self {
        let indices = *data.connections().indices();
        Self {
            indices,
            settings: data.settings(),
            costs,
            connections: data.connections(),
            buildings: data.buildings(),
            fences: data.fences().bits(),
            fences_are_walls: parms.fences_are_walls(),
            expansion_limit: indices.num_grid_cells(),
        }
    }

    pub fn with_expansion_limit(mut self, limit: usize) -> Self {
        self.expansion_limit = limit;
        self
    }

    pub fn search(
        &self,
        start: Cell,
        destination: &Destination,
        ctx: &mut SearchContext,
    ) -> SearchOutcome {
        let start_idx = match self.indices.try_index_of(start) {
            Some(idx) => idx,
            None => return SearchOutcome::NotFound,
        };

        // a single cell is checked by index alone
        let goal_idx = if destination.rect.is_single() && destination.excluded.is_empty() {
            self.indices.try_index_of(destination.rect.min())
        } else {
            None
        };
        let is_goal = |idx: usize| match goal_idx {
            Some(goal) => idx == goal,
            None => {
                destination.rect.contains(self.indices.index_to_cell(idx))
                    && !destination.excluded.contains(&idx)
            }
        };

        let settings = self.settings;
        let reopen_threshold = settings.reopen_threshold();

        ctx.reset_for(self.indices.num_grid_cells());
        let h = self.heuristic(start, destination);
        *ctx.touch(start_idx) = CalcNode {
            g: 0,
            h,
            f: h,
            parent: start_idx,
            status: NodeStatus::Open,
        };
        ctx.open.push(MinScored(h, start_idx));

        let mut expanded = 0;
        while let Some(MinScored(f, idx)) = ctx.open.pop() {
            let node = ctx.nodes[idx];

            // superseded by a cheaper push
            if node.status == NodeStatus::Closed || node.f != f {
                continue;
            }

            if is_goal(idx) {
                return SearchOutcome::Found(self.reconstruct(ctx, start_idx, idx));
            }

            expanded += 1;
            if expanded > self.expansion_limit {
                error!("path search overflowed";
                    "start" => start,
                    "destination" => destination.rect,
                    "expanded" => expanded
                );
                return SearchOutcome::Overflow;
            }

            ctx.nodes[idx].status = NodeStatus::Closed;
            let cell = self.indices.index_to_cell(idx);

            for dir in self.connections.at(idx).iter() {
                let neighbour = cell.neighbour(dir);
                let n_idx = self.indices.index_of(neighbour);

                let cell_cost = self.costs[n_idx];
                if cell_cost >= IMPASSABLE {
                    continue;
                }

                let step = if dir.is_diagonal() {
                    if self.cuts_corner(cell, dir) {
                        continue;
                    }
                    settings.cost_diagonal
                } else {
                    settings.cost_cardinal
                };

                let g = node.g + step + cell_cost;
                let n_node = ctx.touch(n_idx);
                match n_node.status {
                    NodeStatus::Unvisited => {
                        n_node.h = self.heuristic(neighbour, destination);
                    }
                    NodeStatus::Open if g >= n_node.g => continue,
                    NodeStatus::Closed if g + reopen_threshold >= n_node.g => continue,
                    _ => {}
                }

                n_node.g = g;
                n_node.f = g as f32 + n_node.h;
                n_node.parent = idx;
                n_node.status = NodeStatus::Open;
                let f = n_node.f;
                ctx.open.push(MinScored(f, n_idx));
            }
        }

        SearchOutcome::NotFound
    }

    /// Octile distance to the closest cell of the destination
    fn heuristic(&self, from: Cell, destination: &Destination) -> f32 {
        let to = destination.rect.closest_cell_to(from);
        let dx = (to.x - from.x).unsigned_abs();
        let dz = (to.z - from.z).unsigned_abs();
        let (short, long) = if dx < dz { (dx, dz) } else { (dz, dx) };

        let settings = self.settings;
        let octile = settings.cost_diagonal * short + settings.cost_cardinal * (long - short);
        octile as f32 * settings.heuristic_strength
    }

    /// Both cells beside a diagonal step must be free to walk past. Doors count as buildings
    fn cuts_corner(&self, from: Cell, dir: Direction) -> bool {
        let (a, b) = match dir.corners() {
            Some(corners) => corners,
            None => return false,
        };

        [a, b].iter().any(|corner| {
            match self.indices.try_index_of(from.neighbour(*corner)) {
                Some(idx) => {
                    self.costs[idx] >= IMPASSABLE
                        || self.buildings.is_building(idx)
                        || self.buildings.door(idx).is_some()
                        || (self.fences_are_walls && self.fences.get(idx))
                }
                None => true,
            }
        })
    }

    fn reconstruct(&self, ctx: &SearchContext, start: usize, goal: usize) -> PawnPath {
        let mut nodes = Vec::new();
        let mut current = goal;
        loop {
            nodes.push(self.indices.index_to_cell(current));
            if current == start {
                break;
            }
            current = ctx.nodes[current].parent;
        }

        nodes.reverse();
        PawnPath::new(nodes, ctx.nodes[goal].g)
    }
}

/// `MinScored<K, T>` holds a score `K` and a scored object `T` in
/// a pair for use with a `BinaryHeap`.
///
/// `MinScored` compares in reverse order by the score, so that we can
/// use `BinaryHeap` as a min-heap to extract the score-value pair with the
/// least score.
///
/// **Note:** `MinScored` implements a total order (`Ord`), so that it is
/// possible to use float types as scores.
#[derive(Copy, Clone, Debug)]
struct MinScored<K, T>(pub K, pub T);

impl<K: PartialOrd, T> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd, T> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[allow(clippy::eq_op)]
impl<K: PartialOrd, T> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        if a == b {
            Ordering::Equal
        } else if a < b {
            Ordering::Greater
        } else if a > b {
            Ordering::Less
        } else if a != a && b != b {
            // NaN both
            Ordering::Equal
        } else if a != a {
            // NaN sorts last
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}
