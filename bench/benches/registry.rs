//! Registry benchmarks using Criterion.
//!
//! - Entity create/destroy
//! - Single-type and view iteration, including the first (view-building) query
//! - Component emplace/remove
//! - Iteration after churn and across many archetypes

use std::hint::black_box;

use colony_bench::{
    churn::{Churn, ChurnConfig},
    components::*,
};
use colony_ecs::ecs::Registry;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn moving(n: usize) -> Registry {
    let mut registry = Registry::new();
    for i in 0..n {
        let created = registry.create((
            Position {
                x: i as f32,
                ..Default::default()
            },
            Velocity {
                x: 1.0,
                ..Default::default()
            },
        ));
        black_box(created.ok());
    }
    registry
}

// =============================================================================
// Create / Destroy
// =============================================================================

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("single_component", count), &count, |b, &n| {
            b.iter(|| {
                let mut registry = Registry::new();
                for _ in 0..n {
                    black_box(registry.create(Position::default()).ok());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("four_components", count), &count, |b, &n| {
            b.iter(|| {
                let mut registry = Registry::new();
                for _ in 0..n {
                    black_box(
                        registry
                            .create((
                                Transform::default(),
                                Position::default(),
                                Rotation::default(),
                                Velocity::default(),
                            ))
                            .ok(),
                    );
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("with_live_view", count), &count, |b, &n| {
            b.iter(|| {
                let mut registry = Registry::new();
                let _ = registry.range::<(Position, Velocity)>().map(Iterator::count);
                for _ in 0..n {
                    black_box(registry.create((Position::default(), Velocity::default())).ok());
                }
            });
        });
    }

    group.finish();
}

fn bench_destroy(c: &mut Criterion) {
    let mut group = c.benchmark_group("destroy");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("two_components", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let registry = moving(n);
                    let entities: Vec<_> = registry.entities().collect();
                    (registry, entities)
                },
                |(mut registry, entities)| {
                    for entity in entities {
                        black_box(registry.destroy(entity).ok());
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// Iteration
// =============================================================================

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");

    for count in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("single", count), &count, |b, &n| {
            let mut registry = moving(n);
            b.iter(|| {
                if let Ok(positions) = registry.range::<Position>() {
                    for pos in positions {
                        pos.x += 1.0;
                    }
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("pos_vel", count), &count, |b, &n| {
            let mut registry = moving(n);
            b.iter(|| {
                if let Ok(rows) = registry.range::<(Position, Velocity)>() {
                    for (_, (pos, vel)) in rows {
                        pos.x += vel.x;
                        pos.y += vel.y;
                        pos.z += vel.z;
                    }
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("first_query", count), &count, |b, &n| {
            b.iter_batched(
                || moving(n),
                |mut registry| {
                    black_box(registry.range::<(Velocity, Position)>().map(Iterator::count).ok());
                    registry
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_fragmented(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmented");
    let per_archetype = 20;

    group.bench_function("16_archetypes", |b| {
        let mut registry = Registry::new();
        for _ in 0..per_archetype {
            let data = Data { value: 1.0 };
            let created = [
                registry.create((data, MarkerA)),
                registry.create((data, MarkerB)),
                registry.create((data, MarkerC)),
                registry.create((data, MarkerD)),
                registry.create((data, MarkerE)),
                registry.create((data, MarkerF)),
                registry.create((data, MarkerG)),
                registry.create((data, MarkerH)),
                registry.create((data, MarkerI)),
                registry.create((data, MarkerJ)),
                registry.create((data, MarkerK)),
                registry.create((data, MarkerL)),
                registry.create((data, MarkerM)),
                registry.create((data, MarkerN)),
                registry.create((data, MarkerO)),
                registry.create((data, MarkerP)),
            ];
            black_box(created);
        }

        b.iter(|| {
            if let Ok(rows) = registry.range::<(Data, MarkerA)>() {
                for (_, (data, _)) in rows {
                    data.value *= 2.0;
                }
            }
            if let Ok(values) = registry.range::<Data>() {
                for data in values {
                    data.value *= 0.5;
                }
            }
        });
    });

    group.bench_function("after_churn", |b| {
        let mut churn = Churn::new(ChurnConfig::default());
        churn.warm_up();
        churn.run();

        b.iter(|| {
            if let Ok(rows) = churn.registry().range::<(Position, Velocity)>() {
                for (_, (pos, vel)) in rows {
                    pos.x += vel.x;
                }
            }
        });
    });

    group.finish();
}

// =============================================================================
// Emplace / Remove
// =============================================================================

fn bench_emplace_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("emplace_remove");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("emplace", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let mut registry = Registry::new();
                    let _ = registry.range::<(Position, Health)>().map(Iterator::count);
                    for _ in 0..n {
                        let _ = registry.create(Position::default());
                    }
                    let entities: Vec<_> = registry.entities().collect();
                    (registry, entities)
                },
                |(mut registry, entities)| {
                    for entity in entities {
                        black_box(registry.emplace(entity, Health::default()).is_ok());
                    }
                    registry
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("remove", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let registry = moving(n);
                    let entities: Vec<_> = registry.entities().collect();
                    (registry, entities)
                },
                |(mut registry, entities)| {
                    for entity in entities {
                        black_box(registry.remove::<Velocity>(entity).ok());
                    }
                    registry
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_singleton(c: &mut Criterion) {
    c.bench_function("singleton/get_mut", |b| {
        let mut registry = Registry::new();
        let _ = registry.insert_singleton(DeltaTime(1.0 / 60.0));
        b.iter(|| {
            if let Ok(delta) = registry.singleton_mut::<DeltaTime>() {
                delta.0 = black_box(delta.0);
            }
        });
    });

    c.bench_function("back_reference/entity_of", |b| {
        let mut registry = Registry::new();
        let entities: Vec<_> = (0..1_000)
            .filter_map(|_| registry.create((Anchor::default(), Position::default())).ok())
            .collect();
        b.iter(|| {
            for entity in &entities {
                if let Ok(anchor) = registry.get::<Anchor>(*entity) {
                    black_box(registry.sibling::<Position>(anchor).is_ok());
                }
            }
        });
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_destroy,
    bench_range,
    bench_fragmented,
    bench_emplace_remove,
    bench_singleton
);
criterion_main!(benches);
