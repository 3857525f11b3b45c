//! The composed scene graph and the records it holds.

use std::collections::BTreeMap;

use exhibit_core::math::Vec3;
use exhibit_core::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scene::{LightKind, Scene, SceneId};
use crate::trajectory::Trajectory;
use crate::transition::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 35mm full-aperture film back, in millimetres.
pub const HORIZONTAL_APERTURE: f64 = 20.955;
pub const VERTICAL_APERTURE: f64 = 15.955;
pub const CLIPPING_RANGE: [f64; 2] = [0.1, 1000.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub scene_id: SceneId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub focal_length: f64,
    pub fov: f64,
    pub horizontal_aperture: f64,
    pub vertical_aperture: f64,
    pub clipping_range: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightRole {
    Main,
    Fill,
}

impl LightRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LightRole::Main => "main",
            LightRole::Fill => "fill",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub id: String,
    pub scene_id: SceneId,
    pub role: LightRole,
    pub kind: LightKind,
    pub position: Vec3,
    pub intensity: f64,
    pub color: Color,
    pub shadows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub scene_id: SceneId,
    pub name: String,
    pub diffuse_color: Color,
    pub roughness: f64,
    pub metallic: f64,
    pub emission: Color,
}

impl Material {
    pub fn new(id: impl Into<String>, scene_id: SceneId) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            scene_id,
            diffuse_color: Color::NEUTRAL_GREY,
            roughness: 0.5,
            metallic: 0.0,
            emission: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Document,
    Image,
    Audio,
    Video,
    Object,
    Testimony,
    Unknown,
}

impl EvidenceType {
    const ALL: [EvidenceType; 6] = [
        EvidenceType::Document,
        EvidenceType::Image,
        EvidenceType::Audio,
        EvidenceType::Video,
        EvidenceType::Object,
        EvidenceType::Testimony,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Document => "document",
            EvidenceType::Image => "image",
            EvidenceType::Audio => "audio",
            EvidenceType::Video => "video",
            EvidenceType::Object => "object",
            EvidenceType::Testimony => "testimony",
            EvidenceType::Unknown => "unknown",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .unwrap_or(EvidenceType::Unknown)
    }

    /// Infer the type from an id such as `document_0042`.
    pub fn from_id_prefix(evidence_id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| {
                evidence_id
                    .strip_prefix(t.as_str())
                    .is_some_and(|rest| rest.starts_with('_'))
            })
            .unwrap_or(EvidenceType::Unknown)
    }

    /// Where an item of this type sits before blocking. Testimony is placed at
    /// standing eye height, audio sources slightly raised.
    pub fn rest_position(&self) -> Option<Vec3> {
        match self {
            EvidenceType::Document
            | EvidenceType::Image
            | EvidenceType::Video
            | EvidenceType::Object => Some(Vec3::zero()),
            EvidenceType::Audio => Some(Vec3::new(0.0, 1.0, 0.0)),
            EvidenceType::Testimony => Some(Vec3::new(0.0, 1.7, 0.0)),
            EvidenceType::Unknown => None,
        }
    }
}

/// An evidence item placed on a scene's stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceObject {
    pub id: String,
    pub evidence_id: String,
    pub scene_id: SceneId,
    pub evidence_type: EvidenceType,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Absolute timeline time the item is introduced.
    pub start_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: String,
    pub start_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_scene: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_scene: Option<SceneId>,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub id: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<SceneId>,
    pub text: String,
    pub start_time: f64,
    pub duration: f64,
    pub position: Vec3,
    #[serde(default)]
    pub style: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub start_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTrajectory {
    pub scene_id: SceneId,
    pub trajectory: Trajectory,
}

/// Outcome of the blocking solve for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBlocking {
    pub scene_id: SceneId,
    pub iterations: u32,
    pub residual_error: f64,
    pub constraints_satisfied: Vec<String>,
    pub constraints_violated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    pub name: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub resolution: Resolution,
    pub fps: f64,
    /// Latest scene end time, 0 when there are no scenes.
    pub duration: f64,
    pub scenes: Vec<Scene>,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
    pub objects: Vec<EvidenceObject>,
    pub transitions: Vec<TransitionRecord>,
    pub audio: Vec<AudioTrack>,
    pub text_overlays: Vec<TextOverlay>,
    pub captions: Vec<Caption>,
    pub trajectories: Vec<SceneTrajectory>,
    pub blocking: Vec<SceneBlocking>,
}

impl SceneGraph {
    pub fn new(name: impl Into<String>, resolution: Resolution, fps: f64) -> Self {
        Self {
            name: name.into(),
            metadata: BTreeMap::new(),
            resolution,
            fps,
            duration: 0.0,
            scenes: Vec::new(),
            cameras: Vec::new(),
            lights: Vec::new(),
            materials: Vec::new(),
            objects: Vec::new(),
            transitions: Vec::new(),
            audio: Vec::new(),
            text_overlays: Vec::new(),
            captions: Vec::new(),
            trajectories: Vec::new(),
            blocking: Vec::new(),
        }
    }

    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    pub fn objects_in<'a>(&'a self, id: &'a SceneId) -> impl Iterator<Item = &'a EvidenceObject> {
        self.objects.iter().filter(move |o| &o.scene_id == id)
    }

    pub fn trajectory_for(&self, id: &SceneId) -> Option<&Trajectory> {
        self.trajectories
            .iter()
            .find(|t| &t.scene_id == id)
            .map(|t| &t.trajectory)
    }

    /// Recompute `duration` from the scene list.
    pub fn update_duration(&mut self) {
        self.duration = self
            .scenes
            .iter()
            .map(|s| s.end_time)
            .fold(0.0, f64::max);
    }
}
