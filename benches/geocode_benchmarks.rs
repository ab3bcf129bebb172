use criterion::{Criterion, black_box, criterion_group, criterion_main};
use geofind::{DatasetLoader, Geofind, Point};
use serde_json::{Value, json};

/// A side x side grid of unit squares, each its own feature.
fn grid_payload(side: usize) -> Vec<u8> {
    let mut features = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let min_lon = col as f64;
            let min_lat = row as f64;
            let feature: Value = json!({
                "type": "Feature",
                "properties": {"ADMIN": format!("cell-{row}-{col}")},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [min_lon, min_lat],
                        [min_lon + 1.0, min_lat],
                        [min_lon + 1.0, min_lat + 1.0],
                        [min_lon, min_lat + 1.0],
                        [min_lon, min_lat],
                    ]]
                }
            });
            features.push(feature);
        }
    }
    serde_json::to_vec(&json!({
        "type": "FeatureCollection",
        "features": features,
    }))
    .unwrap()
}

fn benchmark_construction(c: &mut Criterion) {
    let payload = grid_payload(20);

    c.bench_function("build_400_shapes", |b| {
        b.iter(|| {
            let payload = payload.clone();
            Geofind::new([DatasetLoader::new("grid", move || payload.clone())]).unwrap()
        })
    });
}

fn benchmark_queries(c: &mut Criterion) {
    let payload = grid_payload(20);
    let engine = Geofind::new([DatasetLoader::new("grid", move || payload.clone())]).unwrap();

    let mut group = c.benchmark_group("reverse_geocode");

    group.bench_function("hit", |b| {
        b.iter(|| engine.reverse_geocode(black_box(Point::new(10.3, 5.7))))
    });

    group.bench_function("miss", |b| {
        b.iter(|| engine.reverse_geocode(black_box(Point::new(120.0, 40.0))))
    });

    group.bench_function("with_geometry", |b| {
        b.iter(|| engine.reverse_geocode_with_geometry(black_box(Point::new(10.3, 5.7)), "grid"))
    });

    group.finish();
}

criterion_group!(benches, benchmark_construction, benchmark_queries);
criterion_main!(benches);
