use misc::*;
use strum::EnumIter;
use unit::map::CellRect;

use crate::map::FactionId;

/// What a traverser is allowed to walk through
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter)]
pub enum TraverseMode {
    /// Opens doors it is allowed to, bashes the rest if it can
    ByPawn,
    /// Every door is passable
    PassDoors,
    NoPassClosedDoors,
    NoPassClosedDoorsOrWater,
    /// Destroys anything in the way
    PassAllDestroyableThings,
    PassAllDestroyablePlayerOwnedThings,
    PassAllDestroyableThingsNotWater,
}

impl TraverseMode {
    pub fn can_destroy(self) -> bool {
        matches!(
            self,
            Self::PassAllDestroyableThings
                | Self::PassAllDestroyablePlayerOwnedThings
                | Self::PassAllDestroyableThingsNotWater
        )
    }

    /// Only player-owned buildings may be destroyed
    pub fn only_player_owned(self) -> bool {
        matches!(self, Self::PassAllDestroyablePlayerOwnedThings)
    }

    pub fn can_pass_water(self) -> bool {
        !matches!(
            self,
            Self::NoPassClosedDoorsOrWater | Self::PassAllDestroyableThingsNotWater
        )
    }

    pub fn blocks_closed_doors(self) -> bool {
        matches!(
            self,
            Self::NoPassClosedDoors | Self::NoPassClosedDoorsOrWater
        )
    }
}

/// How dangerous a cell is, ordered by severity
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Danger {
    None,
    Some,
    Deadly,
}

slog_value_debug!(TraverseMode);

/// Everything about a traverser that decides which cells it can cross
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TraverseParms {
    pub mode: TraverseMode,
    pub max_danger: Danger,
    /// Owner for door and blueprint checks
    pub faction: Option<FactionId>,
    pub can_bash_doors: bool,
    pub can_bash_fences: bool,
    /// Treats fences as walls
    pub fence_blocked: bool,
    pub avoid_persistent_danger: bool,
    pub avoid_darkness_danger: bool,
    pub avoid_fog: bool,
    /// The blueprint being built, which costs nothing to cross
    pub target_buildable: Option<CellRect>,
}

impl TraverseParms {
    pub fn for_mode(mode: TraverseMode) -> Self {
        Self {
            mode,
            max_danger: Danger::Deadly,
            faction: None,
            can_bash_doors: false,
            can_bash_fences: false,
            fence_blocked: false,
            avoid_persistent_danger: false,
            avoid_darkness_danger: false,
            avoid_fog: false,
            target_buildable: None,
        }
    }

    pub fn for_faction(faction: FactionId, max_danger: Danger) -> Self {
        Self {
            faction: Some(faction),
            max_danger,
            ..Self::for_mode(TraverseMode::ByPawn)
        }
    }

    pub fn with_bashing(mut self, doors: bool, fences: bool) -> Self {
        self.can_bash_doors = doors;
        self.can_bash_fences = fences;
        self
    }

    pub fn with_fence_blocked(mut self, fence_blocked: bool) -> Self {
        self.fence_blocked = fence_blocked;
        self
    }

    pub fn with_danger_avoidance(mut self, persistent: bool, darkness: bool) -> Self {
        self.avoid_persistent_danger = persistent;
        self.avoid_darkness_danger = darkness;
        self
    }

    pub fn with_fog_avoidance(mut self, avoid: bool) -> Self {
        self.avoid_fog = avoid;
        self
    }

    pub fn with_target_buildable(mut self, rect: CellRect) -> Self {
        self.target_buildable = Some(rect);
        self
    }

    /// A fence this traverser can neither cross nor bash
    pub fn fences_are_walls(&self) -> bool {
        self.fence_blocked && !self.can_bash_fences
    }
}

impl Default for TraverseParms {
    fn default() -> Self {
        Self::for_mode(TraverseMode::ByPawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn danger_ordering() {
        assert!(Danger::None < Danger::Some);
        assert!(Danger::Some < Danger::Deadly);
    }

    #[test]
    fn water_modes() {
        let blocked = TraverseMode::iter()
            .filter(|m| !m.can_pass_water())
            .collect_vec();
        assert_eq!(
            blocked,
            vec![
                TraverseMode::NoPassClosedDoorsOrWater,
                TraverseMode::PassAllDestroyableThingsNotWater
            ]
        );
    }
}
