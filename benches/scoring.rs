use criterion::{black_box, criterion_group, criterion_main, Criterion};
use physique_scan::composition::analyze_body;
use physique_scan::features::extract_body_features;
use physique_scan::scoring::score_physique;
use physique_scan::{Gender, Landmark};

fn pose() -> Vec<Landmark> {
    let mut pose = vec![Landmark::new(0.5, 0.5); 33];
    pose[0] = Landmark::new(0.5, 0.1);
    pose[11] = Landmark::new(0.3, 0.25);
    pose[12] = Landmark::new(0.7, 0.25);
    pose[15] = Landmark::new(0.3, 0.5);
    pose[16] = Landmark::new(0.7, 0.5);
    pose[23] = Landmark::new(0.35, 0.55);
    pose[24] = Landmark::new(0.65, 0.55);
    pose[27] = Landmark::new(0.35, 1.0);
    pose[28] = Landmark::new(0.65, 1.0);
    pose
}

fn bench_score_physique(c: &mut Criterion) {
    let front = pose();
    let side = vec![Landmark::new(0.5, 0.5); 33];

    c.bench_function("scoring.male.front_only", |b| {
        b.iter(|| score_physique(Gender::Male, black_box(&front), &[], Some(180.0)));
    });
    c.bench_function("scoring.male.front_and_side", |b| {
        b.iter(|| score_physique(Gender::Male, black_box(&front), black_box(&side), None));
    });
}

fn bench_extract_features(c: &mut Criterion) {
    let front = pose();

    c.bench_function("features.extract", |b| {
        b.iter(|| extract_body_features(black_box(&front), &[], Gender::Male));
    });
    c.bench_function("features.fallback", |b| {
        b.iter(|| extract_body_features(black_box(&front[..10]), &[], Gender::Male));
    });
}

fn bench_composition(c: &mut Criterion) {
    let front = pose();

    c.bench_function("composition.analyze_body", |b| {
        b.iter(|| analyze_body(black_box(&front)));
    });
}

criterion_group!(benches, bench_score_physique, bench_extract_features, bench_composition);
criterion_main!(benches);
