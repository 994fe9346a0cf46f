use enumflags2::{bitflags, BitFlags};

/// One of the 8 neighbouring directions. North is +z, east is +x
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 1 << 0,
    East = 1 << 1,
    South = 1 << 2,
    West = 1 << 3,
    NorthEast = 1 << 4,
    SouthEast = 1 << 5,
    SouthWest = 1 << 6,
    NorthWest = 1 << 7,
}

pub type Directions = BitFlags<Direction>;

impl Direction {
    /// Cardinals first
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// (dx, dz)
    pub const fn offset(self) -> (i32, i32) {
        use Direction::*;
        match self {
            North => (0, 1),
            East => (1, 0),
            South => (0, -1),
            West => (-1, 0),
            NorthEast => (1, 1),
            SouthEast => (1, -1),
            SouthWest => (-1, -1),
            NorthWest => (-1, 1),
        }
    }

    pub const fn is_diagonal(self) -> bool {
        use Direction::*;
        matches!(self, NorthEast | SouthEast | SouthWest | NorthWest)
    }

    /// The two orthogonal directions a diagonal step cuts between, None for cardinals
    pub const fn corners(self) -> Option<(Direction, Direction)> {
        use Direction::*;
        match self {
            NorthEast => Some((North, East)),
            SouthEast => Some((South, East)),
            SouthWest => Some((South, West)),
            NorthWest => Some((North, West)),
            _ => None,
        }
    }

    pub const fn opposite(self) -> Self {
        use Direction::*;
        match self {
            North => South,
            East => West,
            South => North,
            West => East,
            NorthEast => SouthWest,
            SouthEast => NorthWest,
            SouthWest => NorthEast,
            NorthWest => SouthEast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_unique_and_opposite() {
        for (i, a) in Direction::ALL.iter().enumerate() {
            let (dx, dz) = a.offset();
            let (ox, oz) = a.opposite().offset();
            assert_eq!((dx + ox, dz + oz), (0, 0));

            for b in Direction::ALL.iter().skip(i + 1) {
                assert_ne!(a.offset(), b.offset());
            }
        }
    }

    #[test]
    fn diagonal_corners_sum_to_diagonal() {
        for dir in Direction::ALL {
            match dir.corners() {
                Some((a, b)) => {
                    assert!(dir.is_diagonal());
                    let (ax, az) = a.offset();
                    let (bx, bz) = b.offset();
                    assert_eq!((ax + bx, az + bz), dir.offset());
                }
                None => assert!(!dir.is_diagonal()),
            }
        }
    }

    #[test]
    fn flags() {
        let all = Directions::all();
        assert_eq!(all.len(), 8);

        let mut some = Directions::empty();
        some |= Direction::North;
        some |= Direction::SouthWest;
        assert!(some.contains(Direction::North));
        assert!(!some.contains(Direction::South));
    }
}
