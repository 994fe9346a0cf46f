/// Static properties of the floor of a cell
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Terrain {
    /// Extra ticks to cross the cell
    pub path_cost: u32,
    pub water: bool,
    /// Nothing can ever stand here
    pub impassable: bool,
    /// Perceived by pawns walking of their own accord
    pub extra_undrafted_cost: u32,
    /// Perceived by drafted pawns
    pub extra_drafted_cost: u32,
}

impl Terrain {
    pub const fn soil() -> Self {
        Self {
            path_cost: 0,
            water: false,
            impassable: false,
            extra_undrafted_cost: 0,
            extra_drafted_cost: 0,
        }
    }

    pub const fn with_cost(path_cost: u32) -> Self {
        Self {
            path_cost,
            ..Self::soil()
        }
    }

    pub const fn mud() -> Self {
        Self {
            path_cost: 14,
            extra_undrafted_cost: 10,
            ..Self::soil()
        }
    }

    pub const fn shallow_water() -> Self {
        Self {
            path_cost: 30,
            water: true,
            extra_undrafted_cost: 30,
            ..Self::soil()
        }
    }

    pub const fn deep_water() -> Self {
        Self {
            path_cost: 42,
            water: true,
            extra_undrafted_cost: 60,
            extra_drafted_cost: 20,
            ..Self::soil()
        }
    }

    pub const fn chasm() -> Self {
        Self {
            impassable: true,
            ..Self::soil()
        }
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::soil()
    }
}
