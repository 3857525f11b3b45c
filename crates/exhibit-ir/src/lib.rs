//! # exhibit-ir
//!
//! The Exhibit scene graph and the pipeline that produces it. A compiled
//! timeline goes in; a blocked, camera-animated scene graph and its USD
//! text come out. Given the same timeline and configuration, every output
//! except the processing time is reproducible byte for byte.

pub mod blocking;
pub mod builder;
pub mod graph;
pub mod scene;
pub mod solver;
pub mod spatial;
pub mod timeline;
pub mod trajectory;
pub mod transition;
pub mod usd;
pub mod validate;

pub use builder::{build_scene_graph, build_scene_graph_with_config, BuildOutput, SceneGraphBuilder};
pub use graph::{EvidenceObject, EvidenceType, Resolution, SceneGraph};
pub use scene::{Scene, SceneId, SceneKind};
pub use solver::SpatialSolver;
pub use spatial::{ConstraintKind, ObjectKind, SpatialConstraint, SpatialObject, SpatialSolution};
pub use timeline::{Clip, ClipError, ClipKind, Timeline};
pub use trajectory::{Keyframe, Trajectory, TrajectoryGenerator};
pub use transition::{Easing, Transition, TransitionType};
pub use usd::{serialize_scene_graph, try_serialize_scene_graph};
pub use validate::{validate, validate_with_evidence, ValidationReport};
