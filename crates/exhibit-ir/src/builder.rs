//! Scene graph construction from a compiled timeline.
//!
//! Clips are visited track by track, in order. Each recognised clip becomes
//! one record in the graph; a clip that cannot be processed is logged and
//! skipped. After all clips are in, scenes are blocked, camera trajectories
//! generated, and the result validated and serialized.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use exhibit_core::hash::hash_text;
use exhibit_core::math::Vec3;
use exhibit_core::{Color, ComposerConfig, ExhibitResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blocking::block_scenes;
use crate::graph::{
    AudioTrack, Camera, Caption, EvidenceObject, EvidenceType, Light, LightRole, Material,
    Resolution, SceneGraph, SceneTrajectory, TextOverlay, TransitionRecord, CLIPPING_RANGE,
    HORIZONTAL_APERTURE, VERTICAL_APERTURE,
};
use crate::scene::{CameraSetup, LightingSetup, Scene, SceneId, SceneKind};
use crate::timeline::{Clip, ClipError, ClipKind, Timeline};
use crate::trajectory::TrajectoryGenerator;
use crate::transition::{Easing, Transition, TransitionType};
use crate::usd::serialize_scene_graph;
use crate::validate::{validate, ValidationReport};

/// Everything one build produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub scene_graph: SceneGraph,
    pub serialized_text: String,
    pub validation_results: ValidationReport,
    /// Wall-clock build time in whole milliseconds. Not part of the
    /// reproducible output.
    pub processing_time_ms: u64,
    /// SHA-256 of `serialized_text`, hex encoded.
    pub content_hash: String,
}

/// Build a scene graph from timeline JSON with the default configuration.
pub fn build_scene_graph(timeline: Value) -> ExhibitResult<BuildOutput> {
    build_scene_graph_with_config(timeline, &ComposerConfig::default())
}

pub fn build_scene_graph_with_config(
    timeline: Value,
    config: &ComposerConfig,
) -> ExhibitResult<BuildOutput> {
    let timeline = Timeline::from_value(timeline)?;
    Ok(SceneGraphBuilder::new(config.clone()).build(&timeline))
}

/// Single-use builder; construct one per build.
pub struct SceneGraphBuilder {
    config: ComposerConfig,
    graph: SceneGraph,
    object_ids: BTreeSet<String>,
}

impl SceneGraphBuilder {
    pub fn new(config: ComposerConfig) -> Self {
        let resolution = Resolution::new(config.output.width, config.output.height);
        let fps = config.output.fps;
        Self {
            config,
            graph: SceneGraph::new("", resolution, fps),
            object_ids: BTreeSet::new(),
        }
    }

    pub fn build(mut self, timeline: &Timeline) -> BuildOutput {
        let started = Instant::now();
        tracing::info!(
            timeline = %timeline.name,
            tracks = timeline.tracks.len(),
            clips = timeline.clip_count(),
            "building scene graph"
        );

        self.graph.name = timeline.name.clone();
        self.graph.metadata = timeline.metadata.clone();
        if let Some(fps) = timeline.fps_override() {
            self.graph.fps = fps;
        }
        if let Some((width, height)) = timeline.resolution_override() {
            self.graph.resolution = Resolution::new(width, height);
        }

        for track in &timeline.tracks {
            for raw in &track.clips {
                let clip = match Clip::from_value(raw) {
                    Ok(clip) => clip,
                    Err(err) => {
                        tracing::warn!(track = %track.name, error = %err, "skipping clip");
                        continue;
                    }
                };
                if clip.kind == ClipKind::Unknown {
                    tracing::debug!(track = %track.name, clip = clip.label(), "ignoring clip of unknown kind");
                    continue;
                }
                if let Err(err) = self.process_clip(&clip) {
                    tracing::warn!(
                        track = %track.name,
                        clip = clip.label(),
                        kind = ?clip.kind,
                        error = %err,
                        "skipping clip"
                    );
                }
            }
        }

        let mut graph = self.graph;
        graph.update_duration();

        block_scenes(&mut graph, &self.config.blocking, &self.config.solver);

        let generator = TrajectoryGenerator::new(self.config.camera.clone());
        graph.trajectories = graph
            .scenes
            .iter()
            .map(|scene| SceneTrajectory {
                scene_id: scene.id.clone(),
                trajectory: generator.generate_trajectory(scene),
            })
            .collect();

        let validation_results = validate(&graph);
        let serialized_text = serialize_scene_graph(&graph);
        let content_hash = hash_text(&serialized_text).to_hex();
        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            scenes = graph.scenes.len(),
            objects = graph.objects.len(),
            valid = validation_results.valid,
            issues = validation_results.issues.len(),
            hash = %content_hash,
            "scene graph built"
        );

        BuildOutput {
            scene_graph: graph,
            serialized_text,
            validation_results,
            processing_time_ms,
            content_hash,
        }
    }

    fn process_clip(&mut self, clip: &Clip) -> Result<(), ClipError> {
        match clip.kind {
            ClipKind::Scene => self.add_scene(clip),
            ClipKind::Evidence => self.add_evidence(clip),
            ClipKind::Transition => self.add_transition(clip),
            ClipKind::Audio => self.add_audio(clip),
            ClipKind::TextOverlay => self.add_text_overlay(clip),
            ClipKind::Caption => self.add_caption(clip),
            ClipKind::Unknown => Ok(()),
        }
    }

    /// A scene plus the camera, lights and materials its clip configures.
    /// Nothing is added unless every part parses.
    fn add_scene(&mut self, clip: &Clip) -> Result<(), ClipError> {
        let scene_id = SceneId::new(clip.require_str("scene_id")?);
        let window = clip.window()?;
        let kind = clip
            .str_field("scene_type")?
            .map(SceneKind::from_tag)
            .unwrap_or_default();

        let mut scene = Scene::new(scene_id.clone(), kind, window);
        scene.title = clip.str_field("title")?.unwrap_or(&clip.name).to_string();

        if let Some(value) = clip.field("camera_config") {
            scene.camera = Some(CameraSetup::from_config(value, &self.config.camera)?);
        }
        if let Some(value) = clip.field("lighting_config") {
            scene.lighting = LightingSetup::from_config(value)?;
        }
        let materials = match clip.field("materials") {
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(i, entry)| material_from_entry(entry, i, &scene_id))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ClipError::wrong_type("materials", "a list")),
            None => Vec::new(),
        };
        scene.materials = materials.iter().map(|m| m.id.clone()).collect();

        if let Some(setup) = &scene.camera {
            self.graph.cameras.push(Camera {
                id: format!("camera_{}", scene_id),
                scene_id: scene_id.clone(),
                position: setup.position,
                rotation: setup.rotation,
                focal_length: setup.focal_length,
                fov: setup.fov,
                horizontal_aperture: HORIZONTAL_APERTURE,
                vertical_aperture: VERTICAL_APERTURE,
                clipping_range: CLIPPING_RANGE,
            });
        }
        if let Some(setup) = &scene.lighting {
            self.graph.lights.push(Light {
                id: format!("{}_main", scene_id),
                scene_id: scene_id.clone(),
                role: LightRole::Main,
                kind: setup.kind,
                position: setup.position,
                intensity: setup.intensity,
                color: setup.color,
                shadows: setup.shadows,
            });
            self.graph.lights.push(Light {
                id: format!("{}_fill", scene_id),
                scene_id: scene_id.clone(),
                role: LightRole::Fill,
                kind: setup.fill_type,
                position: setup.fill_position,
                intensity: setup.fill_intensity,
                color: setup.color,
                shadows: false,
            });
        }
        self.graph.materials.extend(materials);

        tracing::debug!(scene = %scene_id, kind = scene.kind.as_str(), window = %window, "added scene");
        self.graph.scenes.push(scene);
        Ok(())
    }

    fn add_evidence(&mut self, clip: &Clip) -> Result<(), ClipError> {
        let evidence_id = clip.require_str("evidence_id")?.to_string();
        let scene_id = SceneId::new(clip.require_str("scene_id")?);
        let window = clip.window()?;

        let evidence_type = match clip.str_field("evidence_type")? {
            Some(tag) => EvidenceType::from_tag(tag),
            None => EvidenceType::from_id_prefix(&evidence_id),
        };
        let position = match clip.vec3_field("position")? {
            Some(p) => p,
            None => evidence_type.rest_position().unwrap_or_default(),
        };
        let rotation = clip.vec3_field("rotation")?.unwrap_or_default();
        let scale = clip.vec3_field("scale")?.unwrap_or(Vec3::one());

        let id = self.unique_object_id(&format!("{}:{}", scene_id, evidence_id));
        self.graph.objects.push(EvidenceObject {
            id,
            evidence_id,
            scene_id,
            evidence_type,
            position,
            rotation,
            scale,
            start_time: window.start,
            duration: window.duration,
        });
        Ok(())
    }

    fn add_transition(&mut self, clip: &Clip) -> Result<(), ClipError> {
        let window = clip.window()?;
        let mut transition = Transition::for_tag(clip.str_field("transition_type")?.unwrap_or("fade"));
        if clip.duration_seconds.is_some() {
            transition.duration = window.duration;
        }
        if let Some(direction) = clip.str_field("direction")? {
            transition.effect.set_direction(direction);
        }
        if let Some(factor) = clip.f64_field("zoom_factor")? {
            if let TransitionType::Zoom { zoom_factor } = &mut transition.effect {
                *zoom_factor = factor;
            }
        }
        if let Some(tag) = clip.str_field("easing")? {
            transition.easing = Easing::from_tag(tag).ok_or_else(|| ClipError::InvalidValue {
                field: "easing".to_string(),
                message: format!("unknown easing '{}'", tag),
            })?;
        }

        let id = record_id(clip, "transition", self.graph.transitions.len())?;
        self.graph.transitions.push(TransitionRecord {
            id,
            start_time: window.start,
            from_scene: clip.str_field("from_scene")?.map(SceneId::new),
            to_scene: clip.str_field("to_scene")?.map(SceneId::new),
            transition,
        });
        Ok(())
    }

    fn add_audio(&mut self, clip: &Clip) -> Result<(), ClipError> {
        let window = clip.window()?;
        let volume = clip.f64_field("volume")?.unwrap_or(1.0);
        if !(volume >= 0.0) {
            return Err(ClipError::InvalidValue {
                field: "volume".to_string(),
                message: format!("must be non-negative (got {})", volume),
            });
        }
        let source = match clip.media_reference.as_ref().and_then(|m| m.target_url.clone()) {
            Some(url) => Some(url),
            None => clip.str_field("source")?.map(str::to_string),
        };
        let id = record_id(clip, "audio", self.graph.audio.len())?;
        self.graph.audio.push(AudioTrack {
            id,
            start_time: window.start,
            duration: window.duration,
            source,
            volume,
        });
        Ok(())
    }

    fn add_text_overlay(&mut self, clip: &Clip) -> Result<(), ClipError> {
        let text = clip.require_str("text")?.to_string();
        let window = clip.window()?;
        let position = clip.vec3_field("position")?.unwrap_or_default();
        let style = match clip.field("style") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
            Some(_) => return Err(ClipError::wrong_type("style", "an object")),
            None => BTreeMap::new(),
        };
        let id = record_id(clip, "text_overlay", self.graph.text_overlays.len())?;
        self.graph.text_overlays.push(TextOverlay {
            id,
            scene_id: clip.str_field("scene_id")?.map(SceneId::new),
            text,
            start_time: window.start,
            duration: window.duration,
            position,
            style,
        });
        Ok(())
    }

    fn add_caption(&mut self, clip: &Clip) -> Result<(), ClipError> {
        let text = clip.require_str("text")?.to_string();
        let window = clip.window()?;
        let confidence = clip.f64_field("confidence")?;
        if let Some(c) = confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(ClipError::InvalidValue {
                    field: "confidence".to_string(),
                    message: format!("must lie in [0, 1] (got {})", c),
                });
            }
        }
        let id = record_id(clip, "caption", self.graph.captions.len())?;
        self.graph.captions.push(Caption {
            id,
            text,
            speaker: clip.str_field("speaker")?.map(str::to_string),
            confidence,
            start_time: window.start,
            duration: window.duration,
        });
        Ok(())
    }

    fn unique_object_id(&mut self, base: &str) -> String {
        let mut id = base.to_string();
        let mut n = 1;
        while !self.object_ids.insert(id.clone()) {
            id = format!("{}#{}", base, n);
            n += 1;
        }
        id
    }
}

/// Explicit `id` field, else the clip name, else `{prefix}_{index}`.
fn record_id(clip: &Clip, prefix: &str, index: usize) -> Result<String, ClipError> {
    Ok(match clip.str_field("id")? {
        Some(id) if !id.is_empty() => id.to_string(),
        _ if !clip.name.is_empty() => clip.name.clone(),
        _ => format!("{}_{}", prefix, index),
    })
}

#[derive(Deserialize)]
struct MaterialEntry {
    id: Option<String>,
    name: Option<String>,
    diffuse_color: Option<Color>,
    roughness: Option<f64>,
    metallic: Option<f64>,
    emission: Option<Color>,
}

fn material_from_entry(entry: &Value, index: usize, scene_id: &SceneId) -> Result<Material, ClipError> {
    let invalid = |message: String| ClipError::InvalidValue {
        field: format!("materials[{}]", index),
        message,
    };
    match entry {
        Value::String(id) if !id.is_empty() => Ok(Material::new(id.clone(), scene_id.clone())),
        Value::Object(_) => {
            let fields = MaterialEntry::deserialize(entry).map_err(|e| invalid(e.to_string()))?;
            let id = fields
                .id
                .or_else(|| fields.name.clone())
                .unwrap_or_else(|| format!("{}_material_{}", scene_id, index));
            let mut material = Material::new(id, scene_id.clone());
            if let Some(name) = fields.name {
                material.name = name;
            }
            if let Some(color) = fields.diffuse_color {
                material.diffuse_color = color;
            }
            if let Some(emission) = fields.emission {
                material.emission = emission;
            }
            for (field, value, slot) in [
                ("roughness", fields.roughness, &mut material.roughness),
                ("metallic", fields.metallic, &mut material.metallic),
            ] {
                if let Some(v) = value {
                    if !(0.0..=1.0).contains(&v) {
                        return Err(invalid(format!("{} must lie in [0, 1] (got {})", field, v)));
                    }
                    *slot = v;
                }
            }
            Ok(material)
        }
        _ => Err(invalid("expected a material id or object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(timeline: Value) -> BuildOutput {
        build_scene_graph(timeline).unwrap()
    }

    fn scene_clip(id: &str, start: f64, duration: f64) -> Value {
        json!({
            "kind": "scene",
            "name": id,
            "scene_id": id,
            "start_time": start,
            "duration_seconds": duration
        })
    }

    #[test]
    fn test_missing_tracks_is_fatal() {
        assert!(build_scene_graph(json!({"name": "x"})).is_err());
        assert!(build_scene_graph(json!({"tracks": 3})).is_err());
    }

    #[test]
    fn test_empty_timeline() {
        let out = build(json!({"name": "empty", "tracks": []}));
        assert_eq!(out.scene_graph.duration, 0.0);
        assert!(!out.validation_results.valid);
        assert!(out
            .validation_results
            .issues
            .contains(&"scene graph has no scenes".to_string()));
        assert!(out.serialized_text.starts_with("#usda 1.0"));
        assert_eq!(out.content_hash.len(), 64);
    }

    #[test]
    fn test_scene_with_camera_lighting_and_materials() {
        let out = build(json!({
            "name": "t",
            "tracks": [{"name": "main", "clips": [{
                "kind": "scene",
                "name": "Opening",
                "scene_id": "s1",
                "start_time": 0,
                "duration_seconds": 10,
                "metadata": {
                    "scene_type": "overview",
                    "camera_config": {"position": [0, 2, 8]},
                    "lighting_config": {"type": "point", "intensity": 2.0, "color": [1, 0.9, 0.8]},
                    "materials": [
                        "oak",
                        {"name": "steel", "metallic": 1.0, "diffuse_color": "#808080"},
                        {"roughness": 0.2}
                    ]
                }
            }]}]
        }));
        let graph = &out.scene_graph;
        assert_eq!(graph.scenes.len(), 1);
        assert_eq!(graph.scenes[0].kind, SceneKind::Overview);
        assert_eq!(graph.scenes[0].title, "Opening");
        assert_eq!(graph.duration, 10.0);

        assert_eq!(graph.cameras.len(), 1);
        assert_eq!(graph.cameras[0].scene_id, SceneId::new("s1"));
        assert_eq!(graph.cameras[0].position, Vec3::new(0.0, 2.0, 8.0));

        assert_eq!(graph.lights.len(), 2);
        let (main, fill) = (&graph.lights[0], &graph.lights[1]);
        assert_eq!(main.role, LightRole::Main);
        assert_eq!(main.intensity, 2.0);
        assert!(main.shadows);
        assert_eq!(fill.role, LightRole::Fill);
        assert_eq!(fill.intensity, 0.5);
        assert_eq!(fill.color, main.color);
        assert!(!fill.shadows);

        let ids: Vec<&str> = graph.materials.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["oak", "steel", "s1_material_2"]);
        assert_eq!(graph.materials[1].metallic, 1.0);
        assert_eq!(graph.materials[2].roughness, 0.2);
        assert_eq!(graph.scenes[0].materials, vec!["oak", "steel", "s1_material_2"]);

        assert!(out.validation_results.valid);
        assert_eq!(out.validation_results.camera_count, 1);
        assert_eq!(out.validation_results.light_count, 2);
        assert_eq!(out.validation_results.material_count, 3);
        assert_eq!(graph.trajectories.len(), 1);
    }

    #[test]
    fn test_empty_lighting_config_adds_no_lights() {
        let mut clip = scene_clip("s1", 0.0, 5.0);
        clip["lighting_config"] = json!({});
        let out = build(json!({"tracks": [{"clips": [clip]}]}));
        assert!(out.scene_graph.lights.is_empty());
        assert!(out
            .validation_results
            .warnings
            .contains(&"scene graph has no lights".to_string()));
    }

    #[test]
    fn test_thirty_second_scene_with_camera_and_no_lights() {
        let mut clip = scene_clip("scene_001", 0.0, 30.0);
        clip["camera_config"] = json!({"position": [0, 0, 5]});
        clip["lighting_config"] = json!({});
        let out = build(json!({"tracks": [{"clips": [clip]}]}));

        let graph = &out.scene_graph;
        assert_eq!(graph.scenes.len(), 1);
        assert_eq!(graph.cameras.len(), 1);
        assert_eq!(graph.cameras[0].position, Vec3::new(0.0, 0.0, 5.0));
        assert!(graph.lights.is_empty());
        assert_eq!(graph.duration, 30.0);
        assert!(out.validation_results.valid);
        assert!(out
            .validation_results
            .warnings
            .contains(&"scene graph has no lights".to_string()));
    }

    #[test]
    fn test_processing_time_is_whole_milliseconds() {
        let out = build(json!({"tracks": [{"clips": [scene_clip("s1", 0.0, 5.0)]}]}));
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["processing_time_ms"].is_u64());
    }

    #[test]
    fn test_bad_clips_are_skipped() {
        let mut bad_camera = scene_clip("s2", 10.0, 5.0);
        bad_camera["camera_config"] = json!({"position": [1, 2]});
        let out = build(json!({"tracks": [{"clips": [
            scene_clip("s1", 0.0, 10.0),
            {"kind": "scene", "start_time": 20, "duration_seconds": 5},
            bad_camera,
            {"kind": "scene", "scene_id": "neg", "start_time": -3, "duration_seconds": 1},
            {"kind": "hologram", "scene_id": "h"},
            "not a clip",
        ]}]}));
        let graph = &out.scene_graph;
        assert_eq!(graph.scenes.len(), 1);
        assert!(graph.cameras.is_empty());
        assert!(out.validation_results.valid);
    }

    #[test]
    fn test_evidence_clips_are_placed_and_anchored() {
        let out = build(json!({"tracks": [
            {"name": "scenes", "clips": [{
                "kind": "scene", "scene_id": "s1", "start_time": 0, "duration_seconds": 10,
                "scene_type": "evidence_display",
                "camera_config": {}
            }]},
            {"name": "evidence", "clips": [
                {"kind": "evidence", "evidence_id": "document_1", "scene_id": "s1", "start_time": 2},
                {"kind": "evidence", "evidence_id": "testimony_7", "scene_id": "s1", "start_time": 5},
                {"kind": "evidence", "evidence_id": "misc", "scene_id": "s1", "start_time": 6,
                 "metadata": {"position": [3, 0, -2]}},
                {"kind": "evidence", "scene_id": "s1"}
            ]}
        ]}));
        let graph = &out.scene_graph;
        assert_eq!(graph.objects.len(), 3);
        assert_eq!(graph.objects[0].evidence_type, EvidenceType::Document);
        assert_eq!(graph.objects[1].evidence_type, EvidenceType::Testimony);
        assert_eq!(graph.objects[2].evidence_type, EvidenceType::Unknown);
        assert_eq!(graph.objects[0].id, "s1:document_1");

        let anchors = &graph.scenes[0].evidence_anchors;
        assert_eq!(anchors.len(), 3);
        assert_eq!(anchors[0].time, 2.0);
        assert_eq!(graph.blocking.len(), 1);

        let trajectory = graph.trajectory_for(&SceneId::new("s1")).unwrap();
        assert_eq!(trajectory.keyframes.len(), 5);
        assert_eq!(trajectory.keyframes[1].evidence_id.as_deref(), Some("document_1"));
        assert!(out.serialized_text.contains("Evidence_s1_document_1"));
    }

    #[test]
    fn test_duplicate_evidence_ids_get_unique_object_ids() {
        let out = build(json!({"tracks": [{"clips": [
            scene_clip("s1", 0.0, 10.0),
            {"kind": "evidence", "evidence_id": "image_1", "scene_id": "s1"},
            {"kind": "evidence", "evidence_id": "image_1", "scene_id": "s1"}
        ]}]}));
        let ids: Vec<&str> = out.scene_graph.objects.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["s1:image_1", "s1:image_1#1"]);
    }

    #[test]
    fn test_transition_clips() {
        let out = build(json!({"tracks": [{"clips": [
            {"kind": "transition", "transition_type": "dissolve", "start_time": 9},
            {"kind": "transition", "name": "wipe_in", "transition_type": "wipe",
             "duration_seconds": 2.5, "direction": "top_to_bottom"},
            {"kind": "transition", "transition_type": "warp", "easing": "ease_out"},
            {"kind": "transition", "easing": "bounce"}
        ]}]}));
        let t = &out.scene_graph.transitions;
        assert_eq!(t.len(), 3);
        assert_eq!(t[0].id, "transition_0");
        assert_eq!(t[0].transition.duration, 1.5);
        assert_eq!(t[0].transition.easing, Easing::EaseInOut);
        assert_eq!(t[1].id, "wipe_in");
        assert_eq!(t[1].transition.duration, 2.5);
        assert_eq!(
            t[1].transition.effect,
            TransitionType::Wipe {
                direction: "top_to_bottom".into()
            }
        );
        assert_eq!(t[2].transition.effect.name(), "fade");
        assert_eq!(t[2].transition.easing, Easing::EaseOut);
    }

    #[test]
    fn test_audio_text_and_caption_clips() {
        let out = build(json!({"tracks": [{"clips": [
            {"kind": "audio", "name": "narration", "start_time": 0, "duration_seconds": 30,
             "media_reference": {"target_url": "file:///narration.wav", "metadata": {}}},
            {"kind": "text_overlay", "text": "Exhibit A", "scene_id": "s1",
             "position": [0, 1, 0], "style": {"font_size": 32}},
            {"kind": "caption", "text": "I saw the car.", "speaker": "Witness 2", "confidence": 0.93},
            {"kind": "caption", "text": "??", "confidence": 4},
            {"kind": "text_overlay"}
        ]}]}));
        let g = &out.scene_graph;
        assert_eq!(g.audio.len(), 1);
        assert_eq!(g.audio[0].source.as_deref(), Some("file:///narration.wav"));
        assert_eq!(g.audio[0].volume, 1.0);
        assert_eq!(g.text_overlays.len(), 1);
        assert_eq!(g.text_overlays[0].style["font_size"], json!(32));
        assert_eq!(g.captions.len(), 1);
        assert_eq!(g.captions[0].speaker.as_deref(), Some("Witness 2"));
    }

    #[test]
    fn test_timeline_metadata_overrides_output() {
        let out = build(json!({
            "metadata": {"fps": 24, "resolution": [1280, 720], "case": "2024-CV-113"},
            "tracks": [{"clips": [scene_clip("s1", 0.0, 4.0)]}]
        }));
        assert_eq!(out.scene_graph.fps, 24.0);
        assert_eq!(out.scene_graph.resolution, Resolution::new(1280, 720));
        assert!(out.serialized_text.contains("framesPerSecond = 24"));
        assert!(out.serialized_text.contains("string case = \"2024-CV-113\""));
    }

    #[test]
    fn test_content_hash_matches_text() {
        let out = build(json!({"tracks": [{"clips": [scene_clip("s1", 0.0, 4.0)]}]}));
        assert_eq!(out.content_hash, hash_text(&out.serialized_text).to_hex());
    }
}
