use crossbeam::channel::{unbounded, Receiver, Sender};
use misc::*;
use unit::map::{Cell, CellRect};

use crate::map::{AreaId, FactionId, ThingId};

/// Change to the map that may affect path costs or connectivity
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    BuildingSpawned(CellRect),
    BuildingDespawned(CellRect),
    BuildingHitPointsChanged(Cell),
    DoorStateChanged(Cell),
    ThingSpawned {
        thing: ThingId,
        rect: CellRect,
    },
    ThingDespawned {
        thing: ThingId,
        rect: CellRect,
    },
    ReservationAdded {
        thing: ThingId,
        rect: CellRect,
        faction: FactionId,
    },
    ReservationRemoved {
        thing: ThingId,
        rect: CellRect,
        faction: FactionId,
    },
    HaulEnrouteAdded {
        thing: ThingId,
        rect: CellRect,
        faction: FactionId,
    },
    HaulEnrouteReleased {
        thing: ThingId,
        rect: CellRect,
        faction: FactionId,
    },
    FactionRemoved(FactionId),
    FactionRelationsChanged,
    TerrainChanged(Cell),
    /// Catch-all for anything else that changes the cost of a cell
    PathCostRecalculate(Cell),
    AreaChanged {
        area: AreaId,
        cell: Cell,
    },
    CellFogChanged(Cell),
    MapFogged,
    RoofChanged(Cell),
}

impl MapEvent {
    /// Cells whose cost may differ after this event, None if unbounded
    pub fn affected_rect(&self) -> Option<CellRect> {
        use MapEvent::*;
        Some(match self {
            BuildingSpawned(rect) | BuildingDespawned(rect) => *rect,
            BuildingHitPointsChanged(cell)
            | DoorStateChanged(cell)
            | TerrainChanged(cell)
            | PathCostRecalculate(cell)
            | AreaChanged { cell, .. }
            | CellFogChanged(cell)
            | RoofChanged(cell) => CellRect::single(*cell),
            ThingSpawned { rect, .. }
            | ThingDespawned { rect, .. }
            | ReservationAdded { rect, .. }
            | ReservationRemoved { rect, .. }
            | HaulEnrouteAdded { rect, .. }
            | HaulEnrouteReleased { rect, .. } => *rect,
            FactionRemoved(_) | FactionRelationsChanged | MapFogged => return None,
        })
    }

    /// Changes which cells can be walked between, and so the region graph
    pub fn is_structural(&self) -> bool {
        use MapEvent::*;
        matches!(
            self,
            BuildingSpawned(_)
                | BuildingDespawned(_)
                | BuildingHitPointsChanged(_)
                | DoorStateChanged(_)
                | TerrainChanged(_)
        )
    }
}

#[derive(Default)]
pub struct MapEvents {
    subscribers: Vec<Sender<MapEvent>>,
}

impl MapEvents {
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn post(&mut self, event: MapEvent) {
        trace!("map event"; "event" => ?event);

        // disconnected subscribers are dropped
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
