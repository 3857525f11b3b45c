//! Compiled timeline input model.
//!
//! A timeline is a list of tracks holding clips. Tracks are decoded strictly;
//! clips are kept as raw JSON until the builder visits them, so one malformed
//! clip can be skipped without rejecting the whole timeline.

use std::collections::BTreeMap;

use exhibit_core::math::Vec3;
use exhibit_core::{ExhibitError, ExhibitResult, TimeWindow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a single clip could not be turned into a scene-graph record.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("clip is not a valid clip object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has the wrong type (expected {expected})")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("'{field}' must be a finite, non-negative number (got {value})")]
    InvalidTime { field: &'static str, value: f64 },

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ClipError {
    pub(crate) fn wrong_type(field: &str, expected: &'static str) -> Self {
        ClipError::WrongType {
            field: field.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub clips: Vec<Value>,
}

impl Timeline {
    /// Decode a timeline, rejecting documents without a track list.
    pub fn from_value(value: Value) -> ExhibitResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ExhibitError::structural("timeline must be a JSON object"))?;
        match object.get("tracks") {
            Some(Value::Array(_)) => {}
            Some(_) => return Err(ExhibitError::structural("'tracks' must be a list")),
            None => return Err(ExhibitError::structural("timeline has no 'tracks' list")),
        }
        serde_json::from_value(value)
            .map_err(|e| ExhibitError::structural(format!("malformed timeline: {}", e)))
    }

    pub fn from_json_str(text: &str) -> ExhibitResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Frame rate requested by the timeline itself, if any.
    pub fn fps_override(&self) -> Option<f64> {
        self.metadata
            .get("fps")
            .and_then(Value::as_f64)
            .filter(|fps| fps.is_finite() && *fps > 0.0)
    }

    /// Output resolution requested by the timeline itself, as `[width, height]`.
    pub fn resolution_override(&self) -> Option<(u32, u32)> {
        let pair = self.metadata.get("resolution")?.as_array()?;
        match pair.as_slice() {
            [w, h] => {
                let w = u32::try_from(w.as_u64()?).ok()?;
                let h = u32::try_from(h.as_u64()?).ok()?;
                (w > 0 && h > 0).then_some((w, h))
            }
            _ => None,
        }
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }
}

/// The kinds of clip the builder knows how to turn into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipKind {
    Scene,
    Evidence,
    Transition,
    Audio,
    TextOverlay,
    Caption,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// One clip on a track.
///
/// Fields the builder needs beyond the fixed ones (`scene_id`, `camera_config`,
/// `transition_type`, ...) are looked up with [`Clip::field`] on the clip
/// itself, then in `media_reference.metadata`, then in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default, alias = "type")]
    pub kind: ClipKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub media_reference: Option<MediaReference>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Clip {
    pub fn from_value(value: &Value) -> Result<Self, ClipError> {
        Ok(Clip::deserialize(value)?)
    }

    /// Name used in log lines and error reports.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        let present = |v: &&Value| !v.is_null();
        self.extra
            .get(key)
            .filter(present)
            .or_else(|| {
                self.media_reference
                    .as_ref()
                    .and_then(|m| m.metadata.get(key))
                    .filter(present)
            })
            .or_else(|| self.metadata.get(key).filter(present))
    }

    pub fn str_field(&self, key: &str) -> Result<Option<&str>, ClipError> {
        match self.field(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ClipError::wrong_type(key, "a string")),
        }
    }

    pub fn require_str(&self, key: &'static str) -> Result<&str, ClipError> {
        self.str_field(key)?
            .filter(|s| !s.is_empty())
            .ok_or(ClipError::MissingField(key))
    }

    pub fn f64_field(&self, key: &str) -> Result<Option<f64>, ClipError> {
        match self.field(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| ClipError::wrong_type(key, "a number")),
        }
    }

    pub fn vec3_field(&self, key: &str) -> Result<Option<Vec3>, ClipError> {
        self.field(key).map(|v| vec3_from_value(key, v)).transpose()
    }

    /// The clip's `[start, start + duration)` window on the timeline.
    pub fn window(&self) -> Result<TimeWindow, ClipError> {
        let start = checked_time("start_time", self.start_time.unwrap_or(0.0))?;
        let duration = checked_time("duration_seconds", self.duration_seconds.unwrap_or(0.0))?;
        Ok(TimeWindow::new(start, duration))
    }
}

fn checked_time(field: &'static str, value: f64) -> Result<f64, ClipError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ClipError::InvalidTime { field, value })
    }
}

/// Decode a `[x, y, z]` array of finite numbers.
pub(crate) fn vec3_from_value(field: &str, value: &Value) -> Result<Vec3, ClipError> {
    let invalid = || ClipError::InvalidValue {
        field: field.to_string(),
        message: "expected an array of three finite numbers".to_string(),
    };
    let items = value.as_array().ok_or_else(invalid)?;
    let [x, y, z] = items.as_slice() else {
        return Err(invalid());
    };
    let v = Vec3::new(
        x.as_f64().ok_or_else(invalid)?,
        y.as_f64().ok_or_else(invalid)?,
        z.as_f64().ok_or_else(invalid)?,
    );
    if v.is_finite() {
        Ok(v)
    } else {
        Err(invalid())
    }
}
