use exhibit_core::math::Vec3;
use exhibit_core::{CameraDefaults, Color, TimeWindow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timeline::ClipError;

/// Unique identifier for a scene.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a scene shows, which decides how its camera moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    EvidenceDisplay,
    Transition,
    Overview,
    #[default]
    #[serde(other)]
    Default,
}

impl SceneKind {
    /// Parse a `scene_type` tag; anything unrecognised is `Default`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "evidence_display" => SceneKind::EvidenceDisplay,
            "transition" => SceneKind::Transition,
            "overview" => SceneKind::Overview,
            _ => SceneKind::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKind::EvidenceDisplay => "evidence_display",
            SceneKind::Transition => "transition",
            SceneKind::Overview => "overview",
            SceneKind::Default => "default",
        }
    }
}

/// Camera configuration attached to a scene clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSetup {
    pub position: Vec3,
    /// Euler XYZ rotation in degrees.
    pub rotation: Vec3,
    pub focal_length: f64,
    pub fov: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_rotation: Option<Vec3>,
}

#[derive(Deserialize)]
struct CameraOverrides {
    position: Option<Vec3>,
    rotation: Option<Vec3>,
    focal_length: Option<f64>,
    fov: Option<f64>,
    end_position: Option<Vec3>,
    end_rotation: Option<Vec3>,
}

impl CameraSetup {
    pub fn from_defaults(defaults: &CameraDefaults) -> Self {
        Self {
            position: defaults.position,
            rotation: defaults.rotation,
            focal_length: defaults.focal_length,
            fov: defaults.fov,
            end_position: None,
            end_rotation: None,
        }
    }

    /// Read a `camera_config` object, filling unset fields from `defaults`.
    pub fn from_config(value: &Value, defaults: &CameraDefaults) -> Result<Self, ClipError> {
        let o = CameraOverrides::deserialize(value).map_err(|e| ClipError::InvalidValue {
            field: "camera_config".to_string(),
            message: e.to_string(),
        })?;
        let setup = Self {
            position: o.position.unwrap_or(defaults.position),
            rotation: o.rotation.unwrap_or(defaults.rotation),
            focal_length: o.focal_length.unwrap_or(defaults.focal_length),
            fov: o.fov.unwrap_or(defaults.fov),
            end_position: o.end_position,
            end_rotation: o.end_rotation,
        };
        if !(setup.focal_length > 0.0) {
            return Err(ClipError::InvalidValue {
                field: "camera_config.focal_length".to_string(),
                message: format!("must be positive (got {})", setup.focal_length),
            });
        }
        if !(setup.fov > 0.0 && setup.fov < 180.0) {
            return Err(ClipError::InvalidValue {
                field: "camera_config.fov".to_string(),
                message: format!("must lie in (0, 180) degrees (got {})", setup.fov),
            });
        }
        Ok(setup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    #[default]
    Directional,
    Point,
    Spot,
    Area,
}

/// Lighting configuration attached to a scene clip. Produces a main light and
/// a fill light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSetup {
    #[serde(rename = "type")]
    pub kind: LightKind,
    pub position: Vec3,
    pub intensity: f64,
    pub color: Color,
    pub shadows: bool,
    pub fill_type: LightKind,
    pub fill_position: Vec3,
    pub fill_intensity: f64,
}

impl Default for LightingSetup {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::new(0.0, 10.0, 0.0),
            intensity: 1.0,
            color: Color::WHITE,
            shadows: true,
            fill_type: LightKind::Point,
            fill_position: Vec3::new(-5.0, 5.0, 5.0),
            fill_intensity: 0.5,
        }
    }
}

impl LightingSetup {
    /// Read a `lighting_config` object. An empty object counts as no lighting.
    pub fn from_config(value: &Value) -> Result<Option<Self>, ClipError> {
        match value {
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(_) => {
                let setup = Self::deserialize(value).map_err(|e| ClipError::InvalidValue {
                    field: "lighting_config".to_string(),
                    message: e.to_string(),
                })?;
                if !(setup.intensity >= 0.0 && setup.fill_intensity >= 0.0) {
                    return Err(ClipError::InvalidValue {
                        field: "lighting_config".to_string(),
                        message: "intensities must be non-negative".to_string(),
                    });
                }
                Ok(Some(setup))
            }
            _ => Err(ClipError::wrong_type("lighting_config", "an object")),
        }
    }
}

/// An evidence item shown in a scene, with its solved stage position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAnchor {
    pub evidence_id: String,
    /// Seconds from the start of the scene.
    pub time: f64,
    pub position: Vec3,
}

/// A scene in the composed graph: a window of time with its own camera,
/// lighting and materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub kind: SceneKind,
    #[serde(default)]
    pub title: String,
    pub start_time: f64,
    pub duration: f64,
    pub end_time: f64,
    #[serde(default)]
    pub camera: Option<CameraSetup>,
    #[serde(default)]
    pub lighting: Option<LightingSetup>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub evidence_anchors: Vec<EvidenceAnchor>,
}

impl Scene {
    pub fn new(id: SceneId, kind: SceneKind, window: TimeWindow) -> Self {
        Self {
            id,
            kind,
            title: String::new(),
            start_time: window.start,
            duration: window.duration,
            end_time: window.end(),
            camera: None,
            lighting: None,
            materials: Vec::new(),
            evidence_anchors: Vec::new(),
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.duration)
    }
}
