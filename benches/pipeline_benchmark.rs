use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use firerisk::{encode, ArtifactStore, AttributeRecord, RiskPredictor};
use serde_json::json;

fn setup_benchmark_predictor() -> RiskPredictor {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    RiskPredictor::builder()
        .with_artifacts(&ArtifactStore::new(fixtures))
        .unwrap()
        .build()
        .unwrap()
}

fn sample_input() -> serde_json::Value {
    json!({
        "CITY": "Paradise",
        "COUNTY": "Butte",
        "VEGCLERANCE": "Unknown",
        "STRUCTURET_STANDARDIZED": "Mobile Home",
        "ROOFCONSTRUCTR": "Wood",
        "EAVES": "Unenclosed",
        "VENTSCREEN": "Unscreened",
        "EXTERIORSI": "Combustible",
        "WINDOWPANE": "Single Pane",
        "TOPOGRAPHY": "Slope",
        "YEARBUILT": 1975,
    })
}

fn bench_encoding(c: &mut Criterion) {
    let predictor = setup_benchmark_predictor();
    let record = AttributeRecord::from_json(&sample_input()).unwrap();
    let mut group = c.benchmark_group("Encoding");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("record_from_json", |b| {
        let input = sample_input();
        b.iter(|| AttributeRecord::from_json(black_box(&input)).unwrap())
    });

    group.bench_function("one_hot_encode", |b| {
        b.iter(|| encode(black_box(&record), predictor.schema()))
    });

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let predictor = setup_benchmark_predictor();
    let input = sample_input();
    let record = AttributeRecord::from_json(&input).unwrap();
    let vector = predictor.encode(&record);
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("forest_only", |b| {
        b.iter(|| predictor.engine().predict(black_box(&vector)).unwrap())
    });

    group.bench_function("end_to_end", |b| {
        b.iter(|| predictor.predict_risk(black_box(&input)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_encoding, bench_prediction);
criterion_main!(benches);
