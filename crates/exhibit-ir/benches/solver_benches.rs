use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exhibit_core::{Aabb, Vec3};
use exhibit_ir::spatial::{ConstraintKind, ObjectKind, SpatialConstraint, SpatialObject};
use exhibit_ir::{build_scene_graph, SpatialSolver};
use serde_json::{json, Value};

/// A crowded stage: every pair must separate and everyone stays on stage.
fn crowded_stage(n: usize) -> SpatialSolver {
    let bounds = Aabb::new(Vec3::new(-10.0, 0.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
    let mut solver = SpatialSolver::new();
    for i in 0..n {
        let x = (i as f64 * 0.37).sin() * 3.0;
        let z = (i as f64 * 0.53).cos() * 3.0;
        solver.add_object(SpatialObject::new(
            format!("ev{}", i),
            ObjectKind::Evidence,
            Vec3::new(x, 0.0, z),
        ));
    }
    for i in 0..n {
        for j in i + 1..n {
            let (a, b) = (format!("ev{}", i), format!("ev{}", j));
            solver.add_constraint(SpatialConstraint::new(
                format!("collision:{}:{}", a, b),
                ConstraintKind::Collision { min_separation: 1.0 },
                &[a.as_str(), b.as_str()],
            ));
        }
    }
    for i in 0..n {
        let id = format!("ev{}", i);
        solver.add_constraint(SpatialConstraint::new(
            format!("boundary:{}", id),
            ConstraintKind::Boundary { bounds },
            &[id.as_str()],
        ));
    }
    solver
}

fn long_timeline(scenes: usize, evidence_per_scene: usize) -> Value {
    let mut scene_clips = Vec::new();
    let mut evidence_clips = Vec::new();
    for s in 0..scenes {
        let scene_id = format!("scene_{}", s);
        scene_clips.push(json!({
            "kind": "scene",
            "start_time": s as f64 * 10.0,
            "duration_seconds": 10.0,
            "metadata": {
                "scene_id": scene_id,
                "scene_type": "evidence_display",
                "camera_config": {"position": [0, 3, 9]},
                "lighting_config": {"type": "directional"}
            }
        }));
        for e in 0..evidence_per_scene {
            evidence_clips.push(json!({
                "kind": "evidence",
                "start_time": s as f64 * 10.0 + e as f64,
                "duration_seconds": 1.0,
                "metadata": {"evidence_id": format!("document_{}_{}", s, e), "scene_id": scene_id}
            }));
        }
    }
    json!({
        "name": "bench",
        "tracks": [
            {"name": "scenes", "clips": scene_clips},
            {"name": "evidence", "clips": evidence_clips}
        ]
    })
}

fn bench_solver(c: &mut Criterion) {
    let small = crowded_stage(8);
    let large = crowded_stage(32);
    c.bench_function("solve_crowded_stage_8", |b| b.iter(|| black_box(small.solve())));
    c.bench_function("solve_crowded_stage_32", |b| b.iter(|| black_box(large.solve())));
}

fn bench_pipeline(c: &mut Criterion) {
    let timeline = long_timeline(20, 6);
    c.bench_function("build_scene_graph_20x6", |b| {
        b.iter(|| black_box(build_scene_graph(timeline.clone())))
    });
}

criterion_group!(benches, bench_solver, bench_pipeline);
criterion_main!(benches);
