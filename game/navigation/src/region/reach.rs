use std::collections::VecDeque;

use ahash::AHashSet;
use unit::map::{Cell, CellRect};

use crate::cost::BuildingSource;
use crate::map::Factions;
use crate::region::{Region, RegionGrid, RegionKind};
use crate::request::PathRequest;
use crate::utility::door_cost;

impl RegionGrid {
    /// Whether any cell of the destination might be reachable from the start. Never false
    /// for something a search could find, but may be true for something it can't. Traversers
    /// that destroy their way through or fly are assumed to reach everywhere
    pub fn can_reach(
        &self,
        start: Cell,
        destination: CellRect,
        request: &PathRequest,
        buildings: &BuildingSource,
        factions: &Factions,
    ) -> bool {
        let parms = request.parms();
        if parms.mode.can_destroy() || request.is_flying() {
            return true;
        }

        // e.g. standing in a wall
        let start = match self.region_at(start) {
            Some(r) => r.id,
            None => return true,
        };

        let destination = match destination.clipped_to(&self.indices) {
            Some(rect) => rect,
            None => return false,
        };

        let targets: AHashSet<_> = destination
            .cells()
            .filter_map(|c| self.cell_regions[self.indices.index_of(c)])
            .collect();
        if targets.contains(&start) {
            return true;
        }

        let passable = |region: &Region| match region.kind {
            RegionKind::Normal => true,
            RegionKind::Fence => !parms.fences_are_walls(),
            RegionKind::Portal => region
                .door
                .and_then(|cell| buildings.door(self.indices.index_of(cell)))
                .map_or(true, |door| {
                    door_cost(door, parms, factions, request.tuning()).is_some()
                }),
        };

        let mut visited = AHashSet::new();
        let mut frontier = VecDeque::new();
        visited.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            for n in self.graph.neighbors(current) {
                if !visited.insert(n) {
                    continue;
                }

                let region = &self.regions[&n];
                if !passable(region) {
                    continue;
                }

                if targets.contains(&n) {
                    return true;
                }
                frontier.push_back(n);
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{PathFinderDataSource, SourceContext};
    use crate::helpers::MapBuilder;
    use crate::map::{Edifice, FactionId, FactionRelation, Map, MapId};
    use crate::settings::PathingSettings;
    use crate::traverse::{Danger, TraverseMode, TraverseParms};

    fn buildings(map: &Map) -> BuildingSource {
        let settings = PathingSettings::default();
        let mut source = BuildingSource::new(map.indices());
        source.compute_all(&SourceContext {
            map,
            requests: &[],
            settings: &settings,
        });
        source
    }

    fn reaches(map: &Map, grid: &RegionGrid, parms: TraverseParms) -> bool {
        let request = PathRequest::builder(MapId(0), Cell::new(0, 1), Cell::new(6, 1))
            .parms(parms)
            .build();
        grid.can_reach(
            request.start(),
            request.target().rect(),
            &request,
            &buildings(map),
            map.factions(),
        )
    }

    #[test]
    fn doors() {
        let (us, them) = (FactionId(1), FactionId(2));
        let map = MapBuilder::from_ascii(
            "
            ...#...
            ...D...
            ...#...
            ",
        )
        .relation(us, them, FactionRelation::Hostile)
        .build();
        let grid = RegionGrid::new(&map, 12);

        // unowned
        assert!(reaches(&map, &grid, TraverseParms::default()));
        assert!(!reaches(
            &map,
            &grid,
            TraverseParms::for_mode(TraverseMode::NoPassClosedDoors)
        ));

        let mut map = map;
        map.spawn_building(
            CellRect::single(Cell::new(3, 1)),
            Edifice::door(100, 45).owned_by(them),
        );
        let grid = RegionGrid::new(&map, 12);
        assert!(reaches(
            &map,
            &grid,
            TraverseParms::for_faction(them, Danger::Deadly)
        ));
        assert!(!reaches(
            &map,
            &grid,
            TraverseParms::for_faction(us, Danger::Deadly)
        ));
        assert!(reaches(
            &map,
            &grid,
            TraverseParms::for_faction(us, Danger::Deadly).with_bashing(true, false)
        ));
        assert!(reaches(
            &map,
            &grid,
            TraverseParms::for_mode(TraverseMode::PassAllDestroyableThings)
        ));
    }

    #[test]
    fn fences_block_only_the_fence_blocked() {
        let map = MapBuilder::from_ascii(
            "
            ...F...
            ...F...
            ...F...
            ",
        )
        .build();
        let grid = RegionGrid::new(&map, 12);

        assert!(reaches(&map, &grid, TraverseParms::default()));
        assert!(!reaches(
            &map,
            &grid,
            TraverseParms::default().with_fence_blocked(true)
        ));
        assert!(reaches(
            &map,
            &grid,
            TraverseParms::default()
                .with_fence_blocked(true)
                .with_bashing(false, true)
        ));
    }

    #[test]
    fn sealed_off() {
        let map = MapBuilder::from_ascii(
            "
            ...R...
            ...R...
            ...R...
            ",
        )
        .build();
        let grid = RegionGrid::new(&map, 12);
        assert!(!reaches(&map, &grid, TraverseParms::default()));

        // destination entirely in rock
        let request = PathRequest::builder(MapId(0), Cell::new(0, 1), Cell::new(3, 1)).build();
        assert!(!grid.can_reach(
            request.start(),
            request.target().rect(),
            &request,
            &buildings(&map),
            map.factions(),
        ));
    }
}
