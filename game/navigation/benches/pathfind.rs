use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use misc::*;
use navigation::helpers::MapBuilder;
use navigation::map::{Edifice, Map, MapId};
use navigation::{PathFinder, PathRequest, PathingSettings};
use unit::map::{Cell, CellRect};
use unit::Tick;

const SIZE: u16 = 128;

fn scattered_walls(seed: u64) -> Map {
    let mut rng = seeded_rng(Some(seed));
    let mut builder = MapBuilder::new(SIZE, SIZE);
    for _ in 0..(SIZE as usize * SIZE as usize / 5) {
        let cell = Cell::new(
            rng.gen_range(1, SIZE as i32 - 1),
            rng.gen_range(1, SIZE as i32 - 1),
        );
        builder = builder.wall(cell);
    }
    builder.build()
}

fn corner_to_corner(c: &mut Criterion, name: &str, mut map: Map) {
    let mut finder = PathFinder::new(&mut map, PathingSettings::default());
    let mut tick = 0;
    let end = Cell::new(SIZE as i32 - 1, SIZE as i32 - 1);

    c.bench_function(name, |b| {
        b.iter(|| {
            tick += 1;
            let request = PathRequest::builder(MapId(0), Cell::new(0, 0), end).build();
            black_box(finder.find_path_now(&map, request, Tick(tick)))
        })
    });
}

pub fn search(c: &mut Criterion) {
    corner_to_corner(c, "open map", MapBuilder::new(SIZE, SIZE).build());
    corner_to_corner(c, "scattered walls", scattered_walls(0xbeef));
}

pub fn batch(c: &mut Criterion) {
    let mut map = scattered_walls(0xcafe);
    let mut finder = PathFinder::new(&mut map, PathingSettings::default());
    let mut rng = seeded_rng(Some(1));
    let mut tick = 0;

    c.bench_function("batch of 64", |b| {
        b.iter_batched(
            || {
                (0..64)
                    .map(|_| {
                        let mut cell = || {
                            Cell::new(rng.gen_range(0, SIZE as i32), rng.gen_range(0, SIZE as i32))
                        };
                        PathRequest::builder(MapId(0), cell(), cell()).build()
                    })
                    .collect_vec()
            },
            |requests| {
                tick += 1;
                for request in requests {
                    finder.queue(&map, request);
                }
                finder.tick(&map, Tick(tick))
            },
            BatchSize::SmallInput,
        )
    });
}

pub fn incremental(c: &mut Criterion) {
    let mut map = scattered_walls(0xf00d);
    let mut finder = PathFinder::new(&mut map, PathingSettings::default());
    let mut tick = 0;
    let mut present = false;
    let rect = CellRect::new(Cell::new(60, 60), Cell::new(67, 67));

    c.bench_function("incremental gather", |b| {
        b.iter(|| {
            if present {
                map.despawn_building(rect);
            } else {
                map.spawn_building(rect, Edifice::wall(300));
            }
            present = !present;
            tick += 1;
            finder.tick(&map, Tick(tick))
        })
    });
}

criterion_group!(benches, search, batch, incremental);
criterion_main!(benches);
