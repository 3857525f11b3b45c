//! Blocking: placing each scene's evidence objects on stage before camera work.
//!
//! Objects start at their rest position, fanned out along x, and are then
//! relaxed by a fresh [`SpatialSolver`] so no two overlap and all stay inside
//! the stage volume.

use std::collections::BTreeSet;

use exhibit_core::math::Vec3;
use exhibit_core::{BlockingConfig, SolverConfig};

use crate::graph::{SceneBlocking, SceneGraph};
use crate::scene::EvidenceAnchor;
use crate::solver::SpatialSolver;
use crate::spatial::{ConstraintKind, ObjectKind, SpatialConstraint, SpatialObject};

/// Block every scene of `graph` in order, writing solved positions back into
/// `graph.objects`, anchors into each scene and a report into `graph.blocking`.
pub fn block_scenes(graph: &mut SceneGraph, blocking: &BlockingConfig, solver: &SolverConfig) {
    let mut seen = BTreeSet::new();

    for scene_idx in 0..graph.scenes.len() {
        let scene_id = graph.scenes[scene_idx].id.clone();
        if !seen.insert(scene_id.clone()) {
            tracing::warn!(scene = %scene_id, "duplicate scene id, skipping blocking");
            continue;
        }

        let members: Vec<usize> = graph
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.scene_id == scene_id)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }

        // Fan out at least `min_separation` apart.
        let step = blocking.spread.max(blocking.min_separation);
        let mut spatial = SpatialSolver::with_settings(solver.clone());
        for (rank, &i) in members.iter().enumerate() {
            let object = &graph.objects[i];
            let start = object.position + Vec3::new(rank as f64 * step, 0.0, 0.0);
            spatial.add_object(SpatialObject::new(
                object.id.clone(),
                ObjectKind::Evidence,
                start,
            ));
        }
        for (n, &i) in members.iter().enumerate() {
            for &j in &members[n + 1..] {
                let (a, b) = (&graph.objects[i].id, &graph.objects[j].id);
                spatial.add_constraint(SpatialConstraint::new(
                    format!("collision:{}:{}", a, b),
                    ConstraintKind::Collision {
                        min_separation: blocking.min_separation,
                    },
                    &[a.as_str(), b.as_str()],
                ));
            }
        }
        // Boundaries go last so each relaxation pass ends inside the stage.
        for &i in &members {
            let id = &graph.objects[i].id;
            spatial.add_constraint(SpatialConstraint::new(
                format!("boundary:{}", id),
                ConstraintKind::Boundary {
                    bounds: blocking.stage_bounds,
                },
                &[id.as_str()],
            ));
        }

        let solution = spatial.solve();
        for &i in &members {
            if let Some(solved) = solution.object(&graph.objects[i].id) {
                graph.objects[i].position = solved.position;
            }
        }

        if !solution.constraints_violated.is_empty() {
            tracing::warn!(
                scene = %scene_id,
                violated = solution.constraints_violated.len(),
                residual = solution.total_error,
                "blocking left constraints unsatisfied"
            );
        } else {
            tracing::debug!(scene = %scene_id, iterations = solution.iterations, "scene blocked");
        }

        let window = graph.scenes[scene_idx].window();
        let anchors = members
            .iter()
            .map(|&i| {
                let object = &graph.objects[i];
                EvidenceAnchor {
                    evidence_id: object.evidence_id.clone(),
                    time: window.local_offset(object.start_time),
                    position: object.position,
                }
            })
            .collect();
        graph.scenes[scene_idx].evidence_anchors = anchors;

        graph.blocking.push(SceneBlocking {
            scene_id,
            iterations: solution.iterations,
            residual_error: solution.total_error,
            constraints_satisfied: solution.constraints_satisfied,
            constraints_violated: solution.constraints_violated,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EvidenceObject, EvidenceType, Resolution};
    use crate::scene::{Scene, SceneId, SceneKind};
    use exhibit_core::TimeWindow;

    fn object(id: &str, scene: &str, start_time: f64) -> EvidenceObject {
        EvidenceObject {
            id: id.to_string(),
            evidence_id: id.to_string(),
            scene_id: SceneId::new(scene),
            evidence_type: EvidenceType::Document,
            position: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::one(),
            start_time,
            duration: 1.0,
        }
    }

    fn graph() -> SceneGraph {
        let mut g = SceneGraph::new("t", Resolution::new(1920, 1080), 30.0);
        g.scenes.push(Scene::new(
            SceneId::new("s1"),
            SceneKind::EvidenceDisplay,
            TimeWindow::new(10.0, 10.0),
        ));
        g
    }

    #[test]
    fn test_blocking_separates_objects() {
        let mut g = graph();
        g.objects.push(object("a", "s1", 12.0));
        g.objects.push(object("b", "s1", 15.0));
        g.objects.push(object("c", "s1", 30.0));
        block_scenes(&mut g, &BlockingConfig::default(), &SolverConfig::default());

        let report = &g.blocking[0];
        assert_eq!(report.scene_id, SceneId::new("s1"));
        assert_eq!(
            report.constraints_satisfied.len() + report.constraints_violated.len(),
            6
        );
        assert!(report.constraints_violated.is_empty());
        assert_eq!(report.iterations, 1);
        for (n, a) in g.objects.iter().enumerate() {
            for b in &g.objects[n + 1..] {
                assert!(a.position.distance(&b.position) >= 1.0);
            }
        }

        let stage = BlockingConfig::default().stage_bounds;
        for o in &g.objects {
            assert!(stage.contains(&o.position));
        }
    }

    #[test]
    fn test_anchor_times_are_scene_relative_and_clamped() {
        let mut g = graph();
        g.objects.push(object("a", "s1", 12.0));
        g.objects.push(object("late", "s1", 30.0));
        g.objects.push(object("early", "s1", 0.0));
        block_scenes(&mut g, &BlockingConfig::default(), &SolverConfig::default());
        let times: Vec<f64> = g.scenes[0].evidence_anchors.iter().map(|a| a.time).collect();
        assert_eq!(times, vec![2.0, 10.0, 0.0]);
        assert_eq!(g.scenes[0].evidence_anchors[0].position, g.objects[0].position);
    }

    #[test]
    fn test_objects_of_other_scenes_untouched() {
        let mut g = graph();
        g.objects.push(object("stray", "missing_scene", 0.0));
        block_scenes(&mut g, &BlockingConfig::default(), &SolverConfig::default());
        assert!(g.blocking.is_empty());
        assert_eq!(g.objects[0].position, Vec3::zero());
    }

    #[test]
    fn test_single_object_stays_on_stage() {
        let mut g = graph();
        let mut far = object("far", "s1", 10.0);
        far.position = Vec3::new(40.0, -3.0, 0.0);
        g.objects.push(far);
        block_scenes(&mut g, &BlockingConfig::default(), &SolverConfig::default());
        assert_eq!(g.objects[0].position, Vec3::new(10.0, 0.0, 0.0));
        assert!(g.blocking[0].constraints_violated.is_empty());
    }

    #[test]
    fn test_narrow_spread_is_widened_to_separation() {
        let mut g = graph();
        g.objects.push(object("document_1", "s1", 10.0));
        g.objects.push(object("document_2", "s1", 11.0));
        let blocking = BlockingConfig {
            spread: 0.25,
            ..BlockingConfig::default()
        };
        block_scenes(&mut g, &blocking, &SolverConfig::default());

        let report = &g.blocking[0];
        assert!(report.constraints_violated.is_empty());
        assert_eq!(report.residual_error, 0.0);
        assert_eq!(g.objects[1].position, Vec3::new(1.0, 0.0, 0.0));
    }
}
