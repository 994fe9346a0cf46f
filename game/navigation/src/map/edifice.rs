use crate::map::FactionId;

/// The single building that occupies a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Edifice {
    pub kind: EdificeKind,
    pub faction: Option<FactionId>,
    pub hit_points: u32,
    /// Extra cost of crossing, ignored for walls
    pub path_cost: u32,
    pub indestructible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdificeKind {
    Wall { natural: bool },
    Door(DoorState),
    Fence,
    /// Passable, e.g. tables and beds
    Furniture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorState {
    pub open: bool,
    pub ticks_to_open: u32,
}

impl Edifice {
    fn new(kind: EdificeKind, hit_points: u32) -> Self {
        Self {
            kind,
            faction: None,
            hit_points,
            path_cost: 0,
            indestructible: false,
        }
    }

    pub fn wall(hit_points: u32) -> Self {
        Self::new(EdificeKind::Wall { natural: false }, hit_points)
    }

    pub fn natural_wall(hit_points: u32) -> Self {
        Self::new(EdificeKind::Wall { natural: true }, hit_points)
    }

    pub fn door(hit_points: u32, ticks_to_open: u32) -> Self {
        Self::new(
            EdificeKind::Door(DoorState {
                open: false,
                ticks_to_open,
            }),
            hit_points,
        )
    }

    pub fn fence(hit_points: u32) -> Self {
        Self::new(EdificeKind::Fence, hit_points)
    }

    pub fn furniture(path_cost: u32) -> Self {
        Self {
            path_cost,
            ..Self::new(EdificeKind::Furniture, 100)
        }
    }

    pub fn owned_by(mut self, faction: FactionId) -> Self {
        self.faction = Some(faction);
        self
    }

    pub fn indestructible(mut self) -> Self {
        self.indestructible = true;
        self
    }

    /// Blocks all movement unless bashed through
    pub fn is_impassable(&self) -> bool {
        matches!(self.kind, EdificeKind::Wall { .. })
    }

    pub fn is_fence(&self) -> bool {
        matches!(self.kind, EdificeKind::Fence)
    }

    pub fn is_natural(&self) -> bool {
        matches!(self.kind, EdificeKind::Wall { natural: true })
    }

    pub fn door_state(&self) -> Option<&DoorState> {
        match &self.kind {
            EdificeKind::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn door_mut(&mut self) -> Option<&mut DoorState> {
        match &mut self.kind {
            EdificeKind::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn is_destroyable(&self) -> bool {
        !self.indestructible && self.hit_points > 0
    }

    /// Can never be walked through or bashed
    pub fn is_permanently_impassable(&self) -> bool {
        self.is_impassable() && !self.is_destroyable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_state_only_on_doors() {
        let mut door = Edifice::door(100, 45);
        assert_eq!(
            door.door_state(),
            Some(&DoorState {
                open: false,
                ticks_to_open: 45
            })
        );

        if let Some(state) = door.door_mut() {
            state.open = true;
        }
        assert!(door.door_state().map_or(false, |d| d.open));

        assert!(Edifice::wall(300).door_state().is_none());
        assert!(Edifice::fence(80).door_state().is_none());
    }
}
