use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::SceneGraph;

/// Transitions longer than this are flagged as suspicious.
pub const MAX_TRANSITION_SECONDS: f64 = 10.0;

/// Structural checks on a composed scene graph. Issues make the graph
/// invalid; warnings are informational.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub scene_count: usize,
    pub camera_count: usize,
    pub light_count: usize,
    pub material_count: usize,
    pub object_count: usize,
}

/// Validate a scene graph without checking evidence ids.
pub fn validate(graph: &SceneGraph) -> ValidationReport {
    check(graph, None)
}

/// Validate a scene graph and warn about evidence ids not in `known_evidence`.
pub fn validate_with_evidence(
    graph: &SceneGraph,
    known_evidence: &BTreeSet<String>,
) -> ValidationReport {
    check(graph, Some(known_evidence))
}

fn check(graph: &SceneGraph, known_evidence: Option<&BTreeSet<String>>) -> ValidationReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if graph.scenes.is_empty() {
        issues.push("scene graph has no scenes".to_string());
    }
    if !(graph.duration > 0.0) {
        issues.push(format!(
            "scene graph has non-positive duration ({})",
            graph.duration
        ));
    }
    if graph.resolution.width == 0 || graph.resolution.height == 0 {
        issues.push("scene graph resolution must be non-zero".to_string());
    }
    if !(graph.fps > 0.0) {
        issues.push("scene graph fps must be positive".to_string());
    }

    let mut scene_ids = HashSet::new();
    for scene in &graph.scenes {
        if !scene_ids.insert(&scene.id) {
            issues.push(format!("duplicate scene id: {}", scene.id));
        }
    }

    for (i, a) in graph.scenes.iter().enumerate() {
        for b in &graph.scenes[i + 1..] {
            if a.window().overlaps(&b.window()) {
                issues.push(format!(
                    "overlapping scenes: '{}' {} and '{}' {}",
                    a.id,
                    a.window(),
                    b.id,
                    b.window()
                ));
            }
        }
    }

    if graph.cameras.is_empty() {
        warnings.push("scene graph has no cameras".to_string());
    }
    if graph.lights.is_empty() {
        warnings.push("scene graph has no lights".to_string());
    }

    for object in &graph.objects {
        if !scene_ids.contains(&object.scene_id) {
            warnings.push(format!(
                "evidence object '{}' references unknown scene '{}'",
                object.id, object.scene_id
            ));
        }
        if let Some(known) = known_evidence {
            if !known.contains(&object.evidence_id) {
                warnings.push(format!(
                    "evidence '{}' was not supplied by the evidence store",
                    object.evidence_id
                ));
            }
        }
    }

    for report in &graph.blocking {
        if !report.constraints_violated.is_empty() {
            warnings.push(format!(
                "scene '{}' blocking left {} constraint(s) unsatisfied",
                report.scene_id,
                report.constraints_violated.len()
            ));
        }
    }

    for record in &graph.transitions {
        let duration = record.transition.duration;
        if !(duration > 0.0) {
            warnings.push(format!(
                "transition '{}' has non-positive duration ({})",
                record.id, duration
            ));
        } else if duration > MAX_TRANSITION_SECONDS {
            warnings.push(format!(
                "transition '{}' is unusually long ({}s)",
                record.id, duration
            ));
        }
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
        warnings,
        scene_count: graph.scenes.len(),
        camera_count: graph.cameras.len(),
        light_count: graph.lights.len(),
        material_count: graph.materials.len(),
        object_count: graph.objects.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EvidenceObject, EvidenceType, Resolution, SceneBlocking, TransitionRecord};
    use crate::scene::{Scene, SceneId, SceneKind};
    use crate::transition::Transition;
    use exhibit_core::math::Vec3;
    use exhibit_core::TimeWindow;

    fn graph_with(windows: &[(&str, f64, f64)]) -> SceneGraph {
        let mut graph = SceneGraph::new("g", Resolution::new(1920, 1080), 30.0);
        for (id, start, duration) in windows {
            graph.scenes.push(Scene::new(
                SceneId::new(*id),
                SceneKind::Default,
                TimeWindow::new(*start, *duration),
            ));
        }
        graph.update_duration();
        graph
    }

    fn has_overlap_issue(report: &ValidationReport) -> bool {
        report.issues.iter().any(|i| i.starts_with("overlapping scenes"))
    }

    #[test]
    fn test_validate_empty_graph() {
        let report = validate(&graph_with(&[]));
        assert!(!report.valid);
        assert!(report.issues.contains(&"scene graph has no scenes".to_string()));
        assert!(report.issues.iter().any(|i| i.contains("non-positive duration")));
        assert_eq!(report.scene_count, 0);
    }

    #[test]
    fn test_overlapping_scenes() {
        let report = validate(&graph_with(&[("a", 0.0, 10.0), ("b", 5.0, 10.0)]));
        assert!(!report.valid);
        assert!(report
            .issues
            .contains(&"overlapping scenes: 'a' [0, 10) and 'b' [5, 15)".to_string()));
    }

    #[test]
    fn test_adjacent_scenes_do_not_overlap() {
        let report = validate(&graph_with(&[("a", 0.0, 10.0), ("b", 10.0, 10.0)]));
        assert!(!has_overlap_issue(&report));
        assert!(report.valid);
        assert!(report.warnings.contains(&"scene graph has no cameras".to_string()));
        assert!(report.warnings.contains(&"scene graph has no lights".to_string()));
    }

    #[test]
    fn test_non_adjacent_pair_overlap_is_found() {
        let report = validate(&graph_with(&[
            ("a", 0.0, 30.0),
            ("b", 40.0, 5.0),
            ("c", 20.0, 5.0),
        ]));
        assert!(report
            .issues
            .iter()
            .any(|i| i.starts_with("overlapping scenes: 'a'") && i.contains("'c'")));
    }

    #[test]
    fn test_duplicate_scene_ids() {
        let report = validate(&graph_with(&[("a", 0.0, 5.0), ("a", 5.0, 5.0)]));
        assert!(report.issues.contains(&"duplicate scene id: a".to_string()));
    }

    #[test]
    fn test_evidence_warnings() {
        let mut graph = graph_with(&[("s1", 0.0, 10.0)]);
        for (id, scene) in [("document_1", "s1"), ("image_2", "nowhere")] {
            graph.objects.push(EvidenceObject {
                id: id.to_string(),
                evidence_id: id.to_string(),
                scene_id: SceneId::new(scene),
                evidence_type: EvidenceType::from_id_prefix(id),
                position: Vec3::zero(),
                rotation: Vec3::zero(),
                scale: Vec3::one(),
                start_time: 0.0,
                duration: 1.0,
            });
        }
        let known: BTreeSet<String> = ["document_1".to_string()].into_iter().collect();
        let report = validate_with_evidence(&graph, &known);
        assert!(report.valid);
        assert_eq!(report.object_count, 2);
        assert!(report
            .warnings
            .contains(&"evidence object 'image_2' references unknown scene 'nowhere'".to_string()));
        assert!(report
            .warnings
            .contains(&"evidence 'image_2' was not supplied by the evidence store".to_string()));
        assert!(!report.warnings.iter().any(|w| w.contains("'document_1'")));

        let report = validate(&graph);
        assert!(!report.warnings.iter().any(|w| w.contains("evidence store")));
    }

    #[test]
    fn test_blocking_and_transition_warnings() {
        let mut graph = graph_with(&[("s1", 0.0, 10.0)]);
        graph.blocking.push(SceneBlocking {
            scene_id: SceneId::new("s1"),
            iterations: 100,
            residual_error: 0.5,
            constraints_satisfied: vec![],
            constraints_violated: vec!["collision:a:b".into()],
        });
        let mut long = Transition::for_tag("dissolve");
        long.duration = 12.0;
        graph.transitions.push(TransitionRecord {
            id: "t1".into(),
            start_time: 10.0,
            from_scene: None,
            to_scene: None,
            transition: long,
        });
        let report = validate(&graph);
        assert!(report.valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w == "scene 's1' blocking left 1 constraint(s) unsatisfied"));
        assert!(report.warnings.iter().any(|w| w.contains("unusually long")));
    }
}
