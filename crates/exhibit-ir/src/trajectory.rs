//! Camera trajectories.
//!
//! Each scene gets a list of camera keyframes chosen by its kind, plus curve
//! segments sampled between consecutive keyframes for downstream consumers
//! that want a dense path.

use exhibit_core::math::Vec3;
use exhibit_core::CameraDefaults;
use serde::{Deserialize, Serialize};

use crate::scene::{CameraSetup, EvidenceAnchor, Scene, SceneKind};

/// Number of sample intervals per curve segment (11 points including both ends).
pub const SEGMENT_SUBDIVISIONS: usize = 10;

/// Label describing how a trajectory is meant to be interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationTag {
    Linear,
    /// Curve segments are still sampled linearly; the tag is kept for
    /// compatibility with consumers that key off it.
    Bezier,
    Static,
}

impl InterpolationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpolationTag::Linear => "linear",
            InterpolationTag::Bezier => "bezier",
            InterpolationTag::Static => "static",
        }
    }
}

/// Camera pose and lens at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    /// Euler XYZ rotation in degrees.
    pub rotation: Vec3,
    pub focal_length: f64,
    pub fov: f64,
}

impl CameraPose {
    fn from_setup(setup: &CameraSetup) -> Self {
        Self {
            position: setup.position,
            rotation: setup.rotation,
            focal_length: setup.focal_length,
            fov: setup.fov,
        }
    }

    /// Component-wise linear interpolation.
    pub fn lerp(&self, other: &CameraPose, t: f64) -> CameraPose {
        CameraPose {
            position: self.position.lerp(&other.position, t),
            rotation: self.rotation.lerp(&other.rotation, t),
            focal_length: self.focal_length + (other.focal_length - self.focal_length) * t,
            fov: self.fov + (other.fov - self.fov) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.focal_length.is_finite()
            && self.fov.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds from the start of the scene.
    pub time: f64,
    #[serde(flatten)]
    pub pose: CameraPose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<String>,
}

impl Keyframe {
    pub fn new(time: f64, pose: CameraPose) -> Self {
        Self {
            time,
            pose,
            evidence_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Parameter in `[0, 1]` along the segment.
    pub t: f64,
    #[serde(flatten)]
    pub pose: CameraPose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub points: Vec<CurvePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub keyframes: Vec<Keyframe>,
    pub segments: Vec<CurveSegment>,
    pub interpolation: InterpolationTag,
    pub duration: f64,
    pub total_distance: f64,
    pub average_speed: f64,
}

impl Trajectory {
    /// Assemble a trajectory from keyframes, deriving segments and metrics.
    pub fn from_keyframes(
        keyframes: Vec<Keyframe>,
        interpolation: InterpolationTag,
        duration: f64,
    ) -> Self {
        let segments = keyframes
            .windows(2)
            .map(|pair| sample_linear_segment(&pair[0], &pair[1]))
            .collect();
        let total_distance = keyframes
            .windows(2)
            .map(|pair| pair[0].pose.position.distance(&pair[1].pose.position))
            .sum::<f64>();
        let average_speed = if duration > 0.0 {
            total_distance / duration
        } else {
            0.0
        };
        Self {
            keyframes,
            segments,
            interpolation,
            duration,
            total_distance,
            average_speed,
        }
    }

    /// Camera pose at `time`, interpolated linearly between the surrounding
    /// keyframes and held constant before the first and after the last.
    pub fn sample_at(&self, time: f64) -> Option<CameraPose> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if time <= first.time {
            return Some(first.pose);
        }
        if time >= last.time {
            return Some(last.pose);
        }
        let pair = self
            .keyframes
            .windows(2)
            .find(|pair| time >= pair[0].time && time <= pair[1].time)?;
        let (a, b) = (&pair[0], &pair[1]);
        let span = b.time - a.time;
        if span <= 0.0 {
            return Some(b.pose);
        }
        Some(a.pose.lerp(&b.pose, (time - a.time) / span))
    }
}

/// Sample 11 evenly spaced points between two keyframes.
fn sample_linear_segment(a: &Keyframe, b: &Keyframe) -> CurveSegment {
    let points = (0..=SEGMENT_SUBDIVISIONS)
        .map(|i| {
            let t = i as f64 / SEGMENT_SUBDIVISIONS as f64;
            CurvePoint {
                t,
                pose: a.pose.lerp(&b.pose, t),
            }
        })
        .collect();
    CurveSegment {
        start_time: a.time,
        end_time: b.time,
        points,
    }
}

/// Builds one camera trajectory per scene.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryGenerator {
    defaults: CameraDefaults,
}

impl TrajectoryGenerator {
    pub fn new(defaults: CameraDefaults) -> Self {
        Self { defaults }
    }

    pub fn generate_trajectory(&self, scene: &Scene) -> Trajectory {
        let setup = scene
            .camera
            .clone()
            .unwrap_or_else(|| CameraSetup::from_defaults(&self.defaults));
        let start = CameraPose::from_setup(&setup);
        let end = CameraPose {
            position: setup.end_position.unwrap_or(start.position),
            rotation: setup.end_rotation.unwrap_or(start.rotation),
            ..start
        };
        let duration = scene.duration;

        match scene.kind {
            SceneKind::EvidenceDisplay => {
                let mut keyframes = Vec::with_capacity(scene.evidence_anchors.len() + 2);
                keyframes.push(Keyframe::new(0.0, start));
                for anchor in &scene.evidence_anchors {
                    keyframes.push(self.anchor_keyframe(anchor, &start));
                }
                keyframes.push(Keyframe::new(duration, end));
                keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
                Trajectory::from_keyframes(keyframes, InterpolationTag::Linear, duration)
            }
            SceneKind::Transition => Trajectory::from_keyframes(
                vec![Keyframe::new(0.0, start), Keyframe::new(duration, end)],
                InterpolationTag::Linear,
                duration,
            ),
            SceneKind::Overview => {
                let widen = self.defaults.overview_widen;
                let wide = CameraPose {
                    fov: start.fov * widen,
                    focal_length: start.focal_length / widen,
                    ..start
                };
                Trajectory::from_keyframes(
                    vec![Keyframe::new(0.0, wide), Keyframe::new(duration, end)],
                    InterpolationTag::Bezier,
                    duration,
                )
            }
            SceneKind::Default => Trajectory::from_keyframes(
                vec![Keyframe::new(0.0, start), Keyframe::new(duration, start)],
                InterpolationTag::Static,
                duration,
            ),
        }
    }

    /// Keyframe hovering above an evidence anchor, aimed from the start pose.
    fn anchor_keyframe(&self, anchor: &EvidenceAnchor, start: &CameraPose) -> Keyframe {
        let d = anchor.position - start.position;
        let yaw = d.x.atan2(d.z).to_degrees();
        let pitch = (-d.y).atan2((d.x * d.x + d.z * d.z).sqrt()).to_degrees();
        Keyframe {
            time: anchor.time,
            pose: CameraPose {
                position: anchor.position + Vec3::new(0.0, self.defaults.anchor_height_offset, 0.0),
                rotation: Vec3::new(pitch, yaw, 0.0),
                ..*start
            },
            evidence_id: Some(anchor.evidence_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneId;
    use exhibit_core::TimeWindow;

    fn scene(kind: SceneKind, duration: f64) -> Scene {
        Scene::new(SceneId::new("s"), kind, TimeWindow::new(0.0, duration))
    }

    fn camera(position: Vec3, end_position: Option<Vec3>) -> CameraSetup {
        CameraSetup {
            end_position,
            position,
            ..CameraSetup::from_defaults(&CameraDefaults::default())
        }
    }

    #[test]
    fn test_transition_distance() {
        let mut s = scene(SceneKind::Transition, 2.0);
        s.camera = Some(camera(Vec3::zero(), Some(Vec3::new(3.0, 4.0, 0.0))));
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        assert_eq!(traj.keyframes.len(), 2);
        assert_eq!(traj.total_distance, 5.0);
        assert_eq!(traj.average_speed, 2.5);
        assert_eq!(traj.interpolation, InterpolationTag::Linear);
    }

    #[test]
    fn test_default_scene_is_static() {
        let traj = TrajectoryGenerator::default().generate_trajectory(&scene(SceneKind::Default, 5.0));
        assert_eq!(traj.interpolation, InterpolationTag::Static);
        assert_eq!(traj.keyframes[0].pose, traj.keyframes[1].pose);
        assert_eq!(traj.keyframes[1].time, 5.0);
        assert_eq!(traj.total_distance, 0.0);
        assert_eq!(traj.average_speed, 0.0);
    }

    #[test]
    fn test_zero_duration_has_zero_speed() {
        let mut s = scene(SceneKind::Transition, 0.0);
        s.camera = Some(camera(Vec3::zero(), Some(Vec3::new(1.0, 0.0, 0.0))));
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        assert_eq!(traj.total_distance, 1.0);
        assert_eq!(traj.average_speed, 0.0);
    }

    #[test]
    fn test_overview_opens_wide() {
        let traj = TrajectoryGenerator::default().generate_trajectory(&scene(SceneKind::Overview, 4.0));
        let (first, last) = (&traj.keyframes[0].pose, &traj.keyframes[1].pose);
        assert_eq!(first.fov, 75.0);
        assert!((first.focal_length - 35.0 / 1.5).abs() < 1e-12);
        assert_eq!(last.fov, 50.0);
        assert_eq!(last.focal_length, 35.0);
        assert_eq!(traj.interpolation, InterpolationTag::Bezier);
    }

    #[test]
    fn test_evidence_display_anchor_keyframes() {
        let mut s = scene(SceneKind::EvidenceDisplay, 10.0);
        s.evidence_anchors = vec![
            EvidenceAnchor {
                evidence_id: "late".into(),
                time: 6.0,
                position: Vec3::new(0.0, 0.0, 0.0),
            },
            EvidenceAnchor {
                evidence_id: "early".into(),
                time: 2.0,
                position: Vec3::new(5.0, 0.0, 5.0),
            },
        ];
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        let times: Vec<f64> = traj.keyframes.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 2.0, 6.0, 10.0]);
        assert_eq!(traj.segments.len(), 3);

        let early = &traj.keyframes[1];
        assert_eq!(early.evidence_id.as_deref(), Some("early"));
        assert_eq!(early.pose.position, Vec3::new(5.0, 2.0, 5.0));
        // camera at (0,0,5): d = (5, 0, 0) so the camera turns 90 degrees.
        assert!((early.pose.rotation.y - 90.0).abs() < 1e-12);
        assert_eq!(early.pose.rotation.x, 0.0);

        let late = &traj.keyframes[2];
        // d = (0, 0, -5): looking straight back down -z.
        assert!((late.pose.rotation.y.abs() - 180.0).abs() < 1e-12);
        assert_eq!(late.pose.position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_anchor_pitch_looks_down() {
        let mut s = scene(SceneKind::EvidenceDisplay, 4.0);
        s.camera = Some(camera(Vec3::new(0.0, 3.0, 3.0), None));
        s.evidence_anchors = vec![EvidenceAnchor {
            evidence_id: "e".into(),
            time: 1.0,
            position: Vec3::zero(),
        }];
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        // d = (0, -3, -3): pitch = atan2(3, 3) = 45 degrees.
        assert!((traj.keyframes[1].pose.rotation.x - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_segments_have_eleven_linear_points() {
        let mut s = scene(SceneKind::Transition, 1.0);
        s.camera = Some(camera(Vec3::zero(), Some(Vec3::new(10.0, 0.0, 0.0))));
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        let points = &traj.segments[0].points;
        assert_eq!(points.len(), 11);
        assert_eq!(points[0].pose.position.x, 0.0);
        assert_eq!(points[5].pose.position.x, 5.0);
        assert_eq!(points[10].pose.position.x, 10.0);
        assert_eq!(points[3].t, 0.3);
    }

    #[test]
    fn test_overview_segment_samples_linearly() {
        let mut s = scene(SceneKind::Overview, 10.0);
        s.camera = Some(camera(Vec3::new(0.0, 0.0, 5.0), Some(Vec3::new(10.0, 0.0, 5.0))));
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        assert_eq!(traj.interpolation, InterpolationTag::Bezier);
        assert_eq!(traj.segments.len(), 1);

        let mid = &traj.segments[0].points[5];
        assert_eq!(mid.t, 0.5);
        assert_eq!(mid.pose.position, Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(mid.pose.fov, 62.5);
        let focal = (35.0 / 1.5 + 35.0) / 2.0;
        assert!((mid.pose.focal_length - focal).abs() < 1e-12);
    }

    #[test]
    fn test_sample_at_clamps_and_interpolates() {
        let mut s = scene(SceneKind::Transition, 4.0);
        s.camera = Some(camera(Vec3::zero(), Some(Vec3::new(8.0, 0.0, 0.0))));
        let traj = TrajectoryGenerator::default().generate_trajectory(&s);
        assert_eq!(traj.sample_at(-1.0).unwrap().position.x, 0.0);
        assert_eq!(traj.sample_at(1.0).unwrap().position.x, 2.0);
        assert_eq!(traj.sample_at(99.0).unwrap().position.x, 8.0);
    }
}
