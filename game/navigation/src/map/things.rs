use ahash::AHashMap;
use misc::*;
use unit::map::{CellIndices, CellRect};

use crate::map::FactionId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThingId(pub u64);

slog_value_debug!(ThingId);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ThingKind {
    /// Planned construction
    Blueprint,
    /// Construction in progress
    Frame,
    /// Fire and the like, avoided by pawns who care
    PersistentDanger,
    /// Loose item that pawns prefer not to step over
    Item { perceived_cost: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thing {
    pub id: ThingId,
    pub kind: ThingKind,
    pub rect: CellRect,
    pub faction: Option<FactionId>,
}

impl Thing {
    pub fn is_construction(&self) -> bool {
        matches!(self.kind, ThingKind::Blueprint | ThingKind::Frame)
    }

    pub fn perceived_cost(&self) -> u32 {
        match self.kind {
            ThingKind::Item { perceived_cost } => perceived_cost,
            _ => 0,
        }
    }
}

/// Non-edifice things on the map, indexed by occupied cell
#[derive(Default)]
pub struct ThingStore {
    things: AHashMap<ThingId, Thing>,
    by_cell: AHashMap<usize, SmallVec<[ThingId; 2]>>,
    reservations: AHashMap<ThingId, SmallVec<[FactionId; 2]>>,
    haul_enroute: AHashMap<ThingId, SmallVec<[FactionId; 2]>>,
    next_id: u64,
}

impl ThingStore {
    /// Rect must already be clipped to the map
    pub(crate) fn spawn(
        &mut self,
        indices: &CellIndices,
        kind: ThingKind,
        rect: CellRect,
        faction: Option<FactionId>,
    ) -> ThingId {
        self.next_id += 1;
        let id = ThingId(self.next_id);

        for cell in rect.cells() {
            self.by_cell
                .entry(indices.index_of(cell))
                .or_default()
                .push(id);
        }

        self.things.insert(
            id,
            Thing {
                id,
                kind,
                rect,
                faction,
            },
        );
        id
    }

    pub(crate) fn despawn(&mut self, indices: &CellIndices, id: ThingId) -> Option<Thing> {
        let thing = self.things.remove(&id)?;
        for cell in thing.rect.cells() {
            let idx = indices.index_of(cell);
            if let Some(ids) = self.by_cell.get_mut(&idx) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.by_cell.remove(&idx);
                }
            }
        }

        self.reservations.remove(&id);
        self.haul_enroute.remove(&id);
        Some(thing)
    }

    pub fn get(&self, id: ThingId) -> Option<&Thing> {
        self.things.get(&id)
    }

    pub fn at(&self, index: usize) -> impl Iterator<Item = &Thing> + '_ {
        self.by_cell
            .get(&index)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(move |id| self.things.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thing> + '_ {
        self.things.values()
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    /// Returns false if already present
    pub(crate) fn reserve(&mut self, id: ThingId, faction: FactionId) -> bool {
        Self::add_faction(&mut self.reservations, id, faction)
    }

    pub(crate) fn release_reservation(&mut self, id: ThingId, faction: FactionId) -> bool {
        Self::remove_faction(&mut self.reservations, id, faction)
    }

    pub(crate) fn add_haul_enroute(&mut self, id: ThingId, faction: FactionId) -> bool {
        Self::add_faction(&mut self.haul_enroute, id, faction)
    }

    pub(crate) fn release_haul_enroute(&mut self, id: ThingId, faction: FactionId) -> bool {
        Self::remove_faction(&mut self.haul_enroute, id, faction)
    }

    pub fn is_reserved_by(&self, id: ThingId, faction: FactionId) -> bool {
        self.reservations
            .get(&id)
            .map_or(false, |factions| factions.contains(&faction))
    }

    pub fn has_haul_enroute_by(&self, id: ThingId, faction: FactionId) -> bool {
        self.haul_enroute
            .get(&id)
            .map_or(false, |factions| factions.contains(&faction))
    }

    pub(crate) fn forget_faction(&mut self, faction: FactionId) {
        for factions in self
            .reservations
            .values_mut()
            .chain(self.haul_enroute.values_mut())
        {
            factions.retain(|f| *f != faction);
        }
    }

    fn add_faction(
        map: &mut AHashMap<ThingId, SmallVec<[FactionId; 2]>>,
        id: ThingId,
        faction: FactionId,
    ) -> bool {
        let factions = map.entry(id).or_default();
        if factions.contains(&faction) {
            false
        } else {
            factions.push(faction);
            true
        }
    }

    fn remove_faction(
        map: &mut AHashMap<ThingId, SmallVec<[FactionId; 2]>>,
        id: ThingId,
        faction: FactionId,
    ) -> bool {
        match map.get_mut(&id) {
            Some(factions) => {
                let before = factions.len();
                factions.retain(|f| *f != faction);
                before != factions.len()
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit::map::Cell;

    #[test]
    fn cell_index_follows_spawns() {
        let indices = CellIndices::new(8, 8);
        let mut store = ThingStore::default();
        let rect = CellRect::with_size(Cell::new(2, 2), (2, 2));
        let id = store.spawn(&indices, ThingKind::Blueprint, rect, None);

        let idx = indices.index_of(Cell::new(3, 3));
        assert_eq!(store.at(idx).map(|t| t.id).collect_vec(), vec![id]);

        assert!(store.reserve(id, FactionId(1)));
        assert!(!store.reserve(id, FactionId(1)));
        assert!(store.is_reserved_by(id, FactionId(1)));

        let thing = store.despawn(&indices, id).expect("thing exists");
        assert_eq!(thing.rect, rect);
        assert_eq!(store.at(idx).count(), 0);
        assert!(!store.is_reserved_by(id, FactionId(1)));
    }
}
