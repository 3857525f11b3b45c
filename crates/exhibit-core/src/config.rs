use serde::{Deserialize, Serialize};

use crate::error::ExhibitResult;
use crate::math::{Aabb, Vec3};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: u32,
    pub convergence_threshold: f64,
    /// Fraction of each positional correction applied per iteration.
    pub damping_factor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            convergence_threshold: 1e-6,
            damping_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraDefaults {
    pub position: Vec3,
    pub rotation: Vec3,
    /// Focal length in millimetres.
    pub focal_length: f64,
    /// Field of view in degrees.
    pub fov: f64,
    /// Height above an evidence anchor at which its keyframe is placed.
    pub anchor_height_offset: f64,
    /// Widening factor applied to the opening keyframe of overview shots.
    pub overview_widen: f64,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Vec3::zero(),
            focal_length: 35.0,
            fov: 50.0,
            anchor_height_offset: 2.0,
            overview_widen: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockingConfig {
    /// Minimum separation between two evidence objects of the same scene.
    pub min_separation: f64,
    /// Stage volume evidence objects are kept inside.
    pub stage_bounds: Aabb,
    /// Initial x offset between consecutive evidence objects. Values below
    /// `min_separation` are raised to it.
    pub spread: f64,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            min_separation: 1.0,
            stage_bounds: Aabb::from([-10.0, 0.0, -10.0, 10.0, 10.0, 10.0]),
            spread: 1.5,
        }
    }
}

/// Settings for one scene composition run. Every field has a default so an
/// empty TOML document is a valid configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ComposerConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub camera: CameraDefaults,
    #[serde(default)]
    pub blocking: BlockingConfig,
}

impl ComposerConfig {
    pub fn from_toml_str(contents: &str) -> ExhibitResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
