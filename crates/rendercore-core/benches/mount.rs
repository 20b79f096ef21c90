use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rendercore_testing::{MountTestRule, TestLayout};

const SECTION_COUNT: u64 = 8;
const ROWS_PER_SECTION_SAMPLES: &[u64] = &[16, 64];
const ROW_HEIGHT: f32 = 24.0;

/// Sections are hosts; rows are drawables inside them. `rotate` shifts
/// rows within each section so consecutive trees exercise moves.
fn sections(rule: &MountTestRule, rows_per_section: u64, rotate: u64) -> TestLayout {
    let mut root = TestLayout::group(1080.0, 1920.0);
    for section in 0..SECTION_COUNT {
        let section_id = 1 + section * (rows_per_section + 1);
        let mut host = TestLayout::unit(
            rule.view(section_id),
            1080.0,
            rows_per_section as f32 * ROW_HEIGHT,
        );
        for slot in 0..rows_per_section {
            let row = (slot + rotate) % rows_per_section;
            host = host.child(
                0.0,
                slot as f32 * ROW_HEIGHT,
                TestLayout::unit(rule.drawable(section_id + 1 + row), 1080.0, ROW_HEIGHT),
            );
        }
        root = root.child(0.0, section as f32 * 200.0, host);
    }
    root
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        group.bench_with_input(
            BenchmarkId::new("render_units", SECTION_COUNT * (rows + 1)),
            &rows,
            |b, &rows| {
                let mut rule = MountTestRule::new();
                let layout = sections(&rule, rows, 0);
                b.iter(|| black_box(rule.reduce(&layout).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_initial_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_mount");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        group.bench_with_input(
            BenchmarkId::new("render_units", SECTION_COUNT * (rows + 1)),
            &rows,
            |b, &rows| {
                b.iter_batched(
                    || {
                        let mut rule = MountTestRule::new();
                        let layout = sections(&rule, rows, 0);
                        let tree = rule.reduce(&layout).unwrap();
                        (rule, tree)
                    },
                    |(mut rule, tree)| {
                        rule.mount_tree(tree).unwrap();
                        rule
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_remount_with_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("remount_with_moves");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        group.bench_with_input(
            BenchmarkId::new("render_units", SECTION_COUNT * (rows + 1)),
            &rows,
            |b, &rows| {
                let mut rule = MountTestRule::new();
                let layouts = [sections(&rule, rows, 0), sections(&rule, rows, 1)];
                let trees = [
                    rule.reduce(&layouts[0]).unwrap(),
                    rule.reduce(&layouts[1]).unwrap(),
                ];
                rule.mount_tree(trees[0].clone()).unwrap();
                let mut next = 1;
                b.iter(|| {
                    rule.mount_tree(trees[next].clone()).unwrap();
                    rule.log().clear();
                    next ^= 1;
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reduce,
    bench_initial_mount,
    bench_remount_with_moves
);
criterion_main!(benches);
