use misc::*;
use unit::map::Cell;

/// A found path, consumed node by node as the pawn walks it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PawnPath {
    /// Start first
    nodes: Vec<Cell>,
    cost: u32,
    next: usize,
}

impl PawnPath {
    /// Panics if empty
    pub(crate) fn new(nodes: Vec<Cell>, cost: u32) -> Self {
        assert!(!nodes.is_empty(), "path must contain at least the start");
        // the start is where the pawn already stands
        Self {
            nodes,
            cost,
            next: 1,
        }
    }

    pub fn nodes(&self) -> &[Cell] {
        &self.nodes
    }

    /// Total g cost of the destination
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first_node(&self) -> Cell {
        self.nodes[0]
    }

    pub fn last_node(&self) -> Cell {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes_left(&self) -> usize {
        self.nodes.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.nodes_left() == 0
    }

    pub fn peek_next(&self) -> Option<Cell> {
        self.nodes.get(self.next).copied()
    }

    pub fn consume_next(&mut self) -> Option<Cell> {
        let cell = self.peek_next()?;
        self.next += 1;
        Some(cell)
    }

    /// Every step is to an adjacent cell
    pub fn is_contiguous(&self) -> bool {
        self.nodes
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.is_adjacent_to(*b))
    }
}
