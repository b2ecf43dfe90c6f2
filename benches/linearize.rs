//! Linearization benchmarks.
//!
//! Measures C3 linearization over the shapes that stress it differently:
//! deep single-inheritance chains (long merges of near-identical lists),
//! wide fan-in (many short parent lists), diamond lattices (shared
//! ancestors pruned by the tail rule), and cached re-linearization.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use c3mro::{Hierarchy, HierarchyBuilder};

// =============================================================================
// Hierarchy Builders
// =============================================================================

/// C0 <- C1 <- ... <- C{depth-1}.
fn deep_chain(depth: usize) -> Hierarchy {
    let mut builder = HierarchyBuilder::new();
    builder.declare("C0", &[]);
    for i in 1..depth {
        let name = format!("C{}", i);
        let parent = format!("C{}", i - 1);
        builder.declare(&name, &[parent.as_str()]);
    }
    builder.build().unwrap()
}

/// One leaf deriving from `width` unrelated parents.
fn wide_fan_in(width: usize) -> Hierarchy {
    let mut builder = HierarchyBuilder::new();
    let parent_names: Vec<String> = (0..width).map(|i| format!("P{}", i)).collect();
    for name in &parent_names {
        builder.declare(name, &[]);
    }
    let parents: Vec<&str> = parent_names.iter().map(String::as_str).collect();
    builder.declare("Leaf", &parents);
    builder.build().unwrap()
}

/// Stacked diamonds: each level has two classes over the previous apex.
fn diamond_lattice(levels: usize) -> Hierarchy {
    let mut builder = HierarchyBuilder::new();
    builder.declare("Apex0", &[]);
    for level in 0..levels {
        let apex = format!("Apex{}", level);
        let left = format!("L{}", level);
        let right = format!("R{}", level);
        let next = format!("Apex{}", level + 1);
        builder.declare(&left, &[apex.as_str()]);
        builder.declare(&right, &[apex.as_str()]);
        builder.declare(&next, &[left.as_str(), right.as_str()]);
    }
    builder.build().unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_deep_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_chain");
    for depth in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let leaf_name = format!("C{}", depth - 1);
            b.iter_batched(
                || {
                    let hierarchy = deep_chain(depth);
                    let leaf = hierarchy.id_of(&leaf_name).unwrap();
                    (hierarchy, leaf)
                },
                |(hierarchy, leaf)| black_box(hierarchy.linearize(leaf).unwrap()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_wide_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_fan_in");
    for width in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter_batched(
                || {
                    let hierarchy = wide_fan_in(width);
                    let leaf = hierarchy.id_of("Leaf").unwrap();
                    (hierarchy, leaf)
                },
                |(hierarchy, leaf)| black_box(hierarchy.linearize(leaf).unwrap()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_diamond_lattice(c: &mut Criterion) {
    let mut group = c.benchmark_group("diamond_lattice");
    for levels in [2usize, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let apex_name = format!("Apex{}", levels);
            b.iter_batched(
                || {
                    let hierarchy = diamond_lattice(levels);
                    let apex = hierarchy.id_of(&apex_name).unwrap();
                    (hierarchy, apex)
                },
                |(hierarchy, apex)| black_box(hierarchy.linearize(apex).unwrap()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_cached_relinearization(c: &mut Criterion) {
    // Steady-state cost once the cache is warm: a read-lock and a map hit.
    let hierarchy = diamond_lattice(8);
    let apex = hierarchy.id_of("Apex8").unwrap();
    let _ = hierarchy.linearize(apex).unwrap();

    c.bench_function("cached_relinearization", |b| {
        b.iter(|| black_box(hierarchy.linearize(apex).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_deep_chain,
    bench_wide_fan_in,
    bench_diamond_lattice,
    bench_cached_relinearization
);
criterion_main!(benches);
