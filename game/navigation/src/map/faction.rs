use ahash::{AHashMap, AHashSet};
use misc::*;

/// A group that owns buildings and whose members path together
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactionId(pub u32);

slog_value_debug!(FactionId);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FactionRelation {
    Ally,
    Neutral,
    Hostile,
}

#[derive(Default, Debug, Clone)]
pub struct Factions {
    player: Option<FactionId>,
    relations: AHashMap<(FactionId, FactionId), FactionRelation>,
    removed: AHashSet<FactionId>,
}

impl Factions {
    pub fn set_player(&mut self, faction: FactionId) {
        self.player = Some(faction);
    }

    pub fn player(&self) -> Option<FactionId> {
        self.player
    }

    pub fn is_player(&self, faction: FactionId) -> bool {
        self.player == Some(faction)
    }

    fn key(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn set_relation(&mut self, a: FactionId, b: FactionId, relation: FactionRelation) {
        if a != b {
            self.relations.insert(Self::key(a, b), relation);
        }
    }

    /// Symmetric. A faction is its own ally, unknown pairs are neutral
    pub fn relation(&self, a: FactionId, b: FactionId) -> FactionRelation {
        if a == b {
            return FactionRelation::Ally;
        }

        self.relations
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(FactionRelation::Neutral)
    }

    pub fn is_hostile(&self, a: FactionId, b: FactionId) -> bool {
        self.relation(a, b) == FactionRelation::Hostile
    }

    pub(crate) fn remove(&mut self, faction: FactionId) -> bool {
        self.relations.retain(|(a, b), _| *a != faction && *b != faction);
        if self.player == Some(faction) {
            self.player = None;
        }
        self.removed.insert(faction)
    }

    pub fn is_removed(&self, faction: FactionId) -> bool {
        self.removed.contains(&faction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations_are_symmetric() {
        let mut factions = Factions::default();
        let (a, b, c) = (FactionId(1), FactionId(2), FactionId(3));
        factions.set_relation(b, a, FactionRelation::Hostile);

        assert!(factions.is_hostile(a, b));
        assert!(factions.is_hostile(b, a));
        assert_eq!(factions.relation(a, c), FactionRelation::Neutral);
        assert_eq!(factions.relation(c, c), FactionRelation::Ally);

        assert!(factions.remove(a));
        assert!(!factions.is_hostile(a, b));
        assert!(factions.is_removed(a));
    }
}
