//! Spatial primitives consumed and produced by the constraint solver.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use exhibit_core::math::{Aabb, Axis, Vec3};
use serde::{Deserialize, Serialize};

/// The role an object plays in the blocked scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Camera,
    Light,
    Mesh,
    Evidence,
    Text,
    Annotation,
}

/// An object positioned by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialObject {
    pub id: String,
    pub kind: ObjectKind,
    pub position: Vec3,
    /// Euler XYZ rotation in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Aabb>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
}

fn unit_scale() -> Vec3 {
    Vec3::one()
}

impl SpatialObject {
    pub fn new(id: impl Into<String>, kind: ObjectKind, position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            rotation: Vec3::zero(),
            scale: Vec3::one(),
            bounds: None,
            properties: BTreeMap::new(),
        }
    }
}

/// A subset of the x/y/z axes, written as a string such as `"xz"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisSet {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisSet {
    pub const XYZ: AxisSet = AxisSet {
        x: true,
        y: true,
        z: true,
    };

    pub fn contains(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Selected axes in x, y, z order.
    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(|a| self.contains(*a))
    }

    pub fn is_empty(&self) -> bool {
        !(self.x || self.y || self.z)
    }
}

impl FromStr for AxisSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = AxisSet::default();
        for c in s.chars() {
            match c.to_ascii_lowercase() {
                'x' => set.x = true,
                'y' => set.y = true,
                'z' => set.z = true,
                other => return Err(format!("unknown alignment axis '{}'", other)),
            }
        }
        Ok(set)
    }
}

impl fmt::Display for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in self.axes() {
            write!(f, "{}", axis)?;
        }
        Ok(())
    }
}

/// The kind of a constraint, without its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Position,
    Distance,
    Angle,
    Alignment,
    Boundary,
    Collision,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::Position => write!(f, "position"),
            ConstraintType::Distance => write!(f, "distance"),
            ConstraintType::Angle => write!(f, "angle"),
            ConstraintType::Alignment => write!(f, "alignment"),
            ConstraintType::Boundary => write!(f, "boundary"),
            ConstraintType::Collision => write!(f, "collision"),
        }
    }
}

/// How many participants a constraint kind expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

/// A constraint kind together with its kind-typed target.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    /// Pull one object towards a point.
    Position { target: Vec3 },
    /// Keep two objects at a fixed separation.
    Distance { target: f64 },
    /// Angle in radians at the middle of three objects. Diagnostic only: the
    /// solver reports its error but never moves the participants.
    Angle { target: f64 },
    /// Snap all participants to their centroid on the selected axes.
    Alignment { axes: AxisSet },
    /// Keep one object inside a box.
    Boundary { bounds: Aabb },
    /// Keep two objects at least `min_separation` apart.
    Collision { min_separation: f64 },
}

impl ConstraintKind {
    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            ConstraintKind::Position { .. } => ConstraintType::Position,
            ConstraintKind::Distance { .. } => ConstraintType::Distance,
            ConstraintKind::Angle { .. } => ConstraintType::Angle,
            ConstraintKind::Alignment { .. } => ConstraintType::Alignment,
            ConstraintKind::Boundary { .. } => ConstraintType::Boundary,
            ConstraintKind::Collision { .. } => ConstraintType::Collision,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            ConstraintKind::Position { .. } | ConstraintKind::Boundary { .. } => Arity::Exactly(1),
            ConstraintKind::Distance { .. } | ConstraintKind::Collision { .. } => Arity::Exactly(2),
            ConstraintKind::Angle { .. } => Arity::Exactly(3),
            ConstraintKind::Alignment { .. } => Arity::AtLeast(2),
        }
    }

    fn target_value(&self) -> serde_json::Value {
        match self {
            ConstraintKind::Position { target } => serde_json::json!(target.to_array()),
            ConstraintKind::Distance { target } | ConstraintKind::Angle { target } => {
                serde_json::json!(target)
            }
            ConstraintKind::Alignment { axes } => serde_json::json!(axes.to_string()),
            ConstraintKind::Boundary { bounds } => serde_json::json!(<[f64; 6]>::from(*bounds)),
            ConstraintKind::Collision { min_separation } => serde_json::json!(min_separation),
        }
    }

    fn from_parts(ty: ConstraintType, target: serde_json::Value) -> Result<Self, String> {
        let scalar = |v: &serde_json::Value| {
            v.as_f64()
                .ok_or_else(|| format!("{} constraint target must be a number", ty))
        };
        Ok(match ty {
            ConstraintType::Position => ConstraintKind::Position {
                target: serde_json::from_value(target)
                    .map_err(|e| format!("position constraint target: {}", e))?,
            },
            ConstraintType::Distance => ConstraintKind::Distance {
                target: scalar(&target)?,
            },
            ConstraintType::Angle => ConstraintKind::Angle {
                target: scalar(&target)?,
            },
            ConstraintType::Alignment => {
                let axes = target
                    .as_str()
                    .ok_or_else(|| "alignment constraint target must be an axis string".to_string())?
                    .parse()?;
                ConstraintKind::Alignment { axes }
            }
            ConstraintType::Boundary => ConstraintKind::Boundary {
                bounds: serde_json::from_value(target)
                    .map_err(|e| format!("boundary constraint target: {}", e))?,
            },
            ConstraintType::Collision => ConstraintKind::Collision {
                min_separation: scalar(&target)?,
            },
        })
    }
}

/// A spatial constraint between one or more objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConstraint", into = "RawConstraint")]
pub struct SpatialConstraint {
    pub id: String,
    pub kind: ConstraintKind,
    /// Participating object ids, in kind-specific order.
    pub objects: Vec<String>,
    pub weight: f64,
    pub enabled: bool,
}

impl SpatialConstraint {
    pub fn new(id: impl Into<String>, kind: ConstraintKind, objects: &[&str]) -> Self {
        Self {
            id: id.into(),
            kind,
            objects: objects.iter().map(|s| s.to_string()).collect(),
            weight: 1.0,
            enabled: true,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the participant count matches the kind's arity.
    pub fn has_valid_arity(&self) -> bool {
        self.kind.arity().accepts(self.objects.len())
    }

    pub fn references(&self, object_id: &str) -> bool {
        self.objects.iter().any(|o| o == object_id)
    }
}

/// Wire shape of a constraint: `{ id, kind, objects, target, weight, enabled }`.
#[derive(Serialize, Deserialize)]
struct RawConstraint {
    id: String,
    kind: ConstraintType,
    objects: Vec<String>,
    target: serde_json::Value,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_weight() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

impl TryFrom<RawConstraint> for SpatialConstraint {
    type Error = String;

    fn try_from(raw: RawConstraint) -> Result<Self, Self::Error> {
        if !(raw.weight >= 0.0) {
            return Err(format!("constraint '{}' has negative weight", raw.id));
        }
        Ok(Self {
            kind: ConstraintKind::from_parts(raw.kind, raw.target)?,
            id: raw.id,
            objects: raw.objects,
            weight: raw.weight,
            enabled: raw.enabled,
        })
    }
}

impl From<SpatialConstraint> for RawConstraint {
    fn from(c: SpatialConstraint) -> Self {
        Self {
            id: c.id,
            kind: c.kind.constraint_type(),
            target: c.kind.target_value(),
            objects: c.objects,
            weight: c.weight,
            enabled: c.enabled,
        }
    }
}

/// Result of one `solve()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialSolution {
    /// Every object after relaxation, in insertion order.
    pub objects: Vec<SpatialObject>,
    pub constraints_satisfied: Vec<String>,
    pub constraints_violated: Vec<String>,
    pub total_error: f64,
    pub iterations: u32,
}

impl SpatialSolution {
    pub fn object(&self, id: &str) -> Option<&SpatialObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn is_satisfied(&self, constraint_id: &str) -> bool {
        self.constraints_satisfied.iter().any(|c| c == constraint_id)
    }
}
