//! Deterministic USD-ASCII (`#usda 1.0`) serialization of a scene graph.
//!
//! Output depends only on the graph: prims are written in graph order, maps
//! are ordered, and numbers use Rust's shortest round-trip formatting.

use std::collections::BTreeSet;

use exhibit_core::math::Vec3;
use exhibit_core::Color;
use serde_json::Value;

use crate::graph::{Camera, EvidenceObject, Light, Material, SceneGraph};
use crate::scene::{LightKind, Scene};
use crate::trajectory::{CameraPose, Trajectory};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UsdError {
    #[error("non-finite value in {0}")]
    NonFinite(String),
}

type UsdResult<T> = Result<T, UsdError>;

/// Serialize `graph`, returning an error-comment document instead of failing.
pub fn serialize_scene_graph(graph: &SceneGraph) -> String {
    match try_serialize_scene_graph(graph) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "scene description serialization aborted");
            format!("#usda 1.0\n# ERROR: {}\n", err.to_string().replace('\n', " "))
        }
    }
}

pub fn try_serialize_scene_graph(graph: &SceneGraph) -> UsdResult<String> {
    let mut w = UsdWriter::default();
    let fps = num(graph.fps, "layer fps")?;

    w.line("#usda 1.0");
    w.line("(");
    w.indent();
    w.line("defaultPrim = \"World\"");
    w.line("upAxis = \"Y\"");
    w.line("metersPerUnit = 1");
    w.line(&format!("framesPerSecond = {}", fps));
    w.line(&format!("timeCodesPerSecond = {}", fps));
    w.line("startTimeCode = 0");
    w.line(&format!(
        "endTimeCode = {}",
        num(graph.duration * graph.fps, "layer end time")?
    ));
    w.line("customLayerData = {");
    w.indent();
    w.line(&format!("string name = {}", quote(&graph.name)));
    w.line(&format!("int resolutionWidth = {}", graph.resolution.width));
    w.line(&format!("int resolutionHeight = {}", graph.resolution.height));
    w.dedent();
    w.line("}");
    w.dedent();
    w.line(")");
    w.blank();

    w.open("Xform", "World");
    let mut world_names = PrimNames::default();

    if !graph.metadata.is_empty() {
        w.open("Scope", &world_names.claim("Metadata"));
        let mut keys = PrimNames::default();
        for (key, value) in &graph.metadata {
            write_metadata_entry(&mut w, &mut keys, key, value)?;
        }
        w.close();
    }

    for scene in &graph.scenes {
        write_scene(&mut w, graph, scene, &mut world_names)?;
    }

    if !graph.materials.is_empty() {
        let scope = world_names.claim("Materials");
        w.open("Scope", &scope);
        let mut names = PrimNames::default();
        for material in &graph.materials {
            let name = names.claim(&format!("Material_{}", sanitize(&material.id)));
            write_material(&mut w, &scope, &name, material)?;
        }
        w.close();
    }

    w.close();
    Ok(w.finish())
}

fn write_metadata_entry(
    w: &mut UsdWriter,
    keys: &mut PrimNames,
    key: &str,
    value: &Value,
) -> UsdResult<()> {
    let key = keys.claim(&sanitize(key));
    match value {
        Value::Bool(b) => w.line(&format!("bool {} = {}", key, b)),
        Value::Number(n) => match n.as_f64() {
            Some(f) => w.line(&format!("double {} = {}", key, num(f, &key)?)),
            None => w.line(&format!("string {} = {}", key, quote(&n.to_string()))),
        },
        Value::String(s) => w.line(&format!("string {} = {}", key, quote(s))),
        Value::Null => w.line(&format!("string {} = \"\"", key)),
        other => w.line(&format!("string {} = {}", key, quote(&other.to_string()))),
    }
    Ok(())
}

fn write_scene(
    w: &mut UsdWriter,
    graph: &SceneGraph,
    scene: &Scene,
    world_names: &mut PrimNames,
) -> UsdResult<()> {
    let context = format!("scene '{}'", scene.id);
    w.open("Xform", &world_names.claim(&format!("Scene_{}", sanitize(scene.id.as_str()))));
    w.line(&format!("custom string exhibit:sceneId = {}", quote(scene.id.as_str())));
    w.line(&format!("custom token exhibit:sceneKind = \"{}\"", scene.kind.as_str()));
    if !scene.title.is_empty() {
        w.line(&format!("custom string exhibit:title = {}", quote(&scene.title)));
    }
    w.line(&format!(
        "custom double exhibit:startTime = {}",
        num(scene.start_time, &context)?
    ));
    w.line(&format!(
        "custom double exhibit:duration = {}",
        num(scene.duration, &context)?
    ));
    if !scene.materials.is_empty() {
        let ids: Vec<String> = scene.materials.iter().map(|m| quote(m)).collect();
        w.line(&format!("custom string[] exhibit:materials = [{}]", ids.join(", ")));
    }

    let mut names = PrimNames::default();
    for object in graph.objects_in(&scene.id) {
        let name = names.claim(&format!("Evidence_{}", sanitize(&object.id)));
        write_evidence(w, &name, object)?;
    }

    let trajectory = graph.trajectory_for(&scene.id);
    for camera in graph.cameras.iter().filter(|c| c.scene_id == scene.id) {
        let name = names.claim(&format!("Camera_{}", sanitize(&camera.id)));
        write_camera(w, &name, camera, scene, trajectory, graph.fps)?;
    }

    for light in graph.lights.iter().filter(|l| l.scene_id == scene.id) {
        let name = names.claim(&format!("Light_{}", sanitize(&light.id)));
        write_light(w, &name, light)?;
    }

    w.close();
    Ok(())
}

fn write_evidence(w: &mut UsdWriter, name: &str, object: &EvidenceObject) -> UsdResult<()> {
    let context = format!("evidence object '{}'", object.id);
    w.open("Xform", name);
    w.line(&format!(
        "custom string exhibit:evidenceId = {}",
        quote(&object.evidence_id)
    ));
    w.line(&format!(
        "custom token exhibit:evidenceType = \"{}\"",
        object.evidence_type.as_str()
    ));
    w.line(&format!(
        "custom double exhibit:startTime = {}",
        num(object.start_time, &context)?
    ));
    w.line(&format!(
        "double3 xformOp:translate = {}",
        vec3(object.position, &context)?
    ));
    w.line(&format!(
        "float3 xformOp:rotateXYZ = {}",
        vec3(object.rotation, &context)?
    ));
    w.line(&format!("float3 xformOp:scale = {}", vec3(object.scale, &context)?));
    w.line(
        "uniform token[] xformOpOrder = [\"xformOp:translate\", \"xformOp:rotateXYZ\", \"xformOp:scale\"]",
    );
    w.close();
    Ok(())
}

fn write_camera(
    w: &mut UsdWriter,
    name: &str,
    camera: &Camera,
    scene: &Scene,
    trajectory: Option<&Trajectory>,
    fps: f64,
) -> UsdResult<()> {
    let context = format!("camera '{}'", camera.id);
    w.open("Camera", name);
    w.line(&format!(
        "float horizontalAperture = {}",
        num(camera.horizontal_aperture, &context)?
    ));
    w.line(&format!(
        "float verticalAperture = {}",
        num(camera.vertical_aperture, &context)?
    ));
    w.line(&format!(
        "float2 clippingRange = ({}, {})",
        num(camera.clipping_range[0], &context)?,
        num(camera.clipping_range[1], &context)?
    ));

    let samples = trajectory.map(|t| time_samples(t, scene.start_time, fps)).unwrap_or_default();
    if samples.is_empty() {
        w.line(&format!(
            "float focalLength = {}",
            num(camera.focal_length, &context)?
        ));
        w.line(&format!(
            "double3 xformOp:translate = {}",
            vec3(camera.position, &context)?
        ));
        w.line(&format!(
            "float3 xformOp:rotateXYZ = {}",
            vec3(camera.rotation, &context)?
        ));
    } else {
        write_samples(w, "float focalLength", &samples, &context, |p| {
            num(p.focal_length, &context)
        })?;
        write_samples(w, "double3 xformOp:translate", &samples, &context, |p| {
            vec3(p.position, &context)
        })?;
        write_samples(w, "float3 xformOp:rotateXYZ", &samples, &context, |p| {
            vec3(p.rotation, &context)
        })?;
    }
    w.line("uniform token[] xformOpOrder = [\"xformOp:translate\", \"xformOp:rotateXYZ\"]");
    w.close();
    Ok(())
}

/// Keyframes converted to absolute time codes. A later keyframe at the same
/// time code replaces the earlier one.
fn time_samples(trajectory: &Trajectory, scene_start: f64, fps: f64) -> Vec<(f64, CameraPose)> {
    let mut samples: Vec<(f64, CameraPose)> = Vec::with_capacity(trajectory.keyframes.len());
    for keyframe in &trajectory.keyframes {
        let code = (scene_start + keyframe.time) * fps;
        match samples.last_mut() {
            Some(last) if last.0 == code => last.1 = keyframe.pose,
            _ => samples.push((code, keyframe.pose)),
        }
    }
    samples
}

fn write_samples<F>(
    w: &mut UsdWriter,
    attribute: &str,
    samples: &[(f64, CameraPose)],
    context: &str,
    value: F,
) -> UsdResult<()>
where
    F: Fn(&CameraPose) -> UsdResult<String>,
{
    w.line(&format!("{}.timeSamples = {{", attribute));
    w.indent();
    for (code, pose) in samples {
        w.line(&format!("{}: {},", num(*code, context)?, value(pose)?));
    }
    w.dedent();
    w.line("}");
    Ok(())
}

fn light_prim_type(kind: LightKind) -> &'static str {
    match kind {
        LightKind::Directional => "DistantLight",
        LightKind::Point => "SphereLight",
        LightKind::Spot => "SphereLight",
        LightKind::Area => "RectLight",
    }
}

fn write_light(w: &mut UsdWriter, name: &str, light: &Light) -> UsdResult<()> {
    let context = format!("light '{}'", light.id);
    w.open(light_prim_type(light.kind), name);
    w.line(&format!("custom token exhibit:role = \"{}\"", light.role.as_str()));
    w.line(&format!(
        "float inputs:intensity = {}",
        num(light.intensity, &context)?
    ));
    w.line(&format!("color3f inputs:color = {}", color(light.color, &context)?));
    w.line(&format!("bool inputs:shadow:enable = {}", light.shadows));
    if light.kind == LightKind::Spot {
        w.line("float inputs:shaping:cone:angle = 45");
    }
    w.line(&format!(
        "double3 xformOp:translate = {}",
        vec3(light.position, &context)?
    ));
    w.line("uniform token[] xformOpOrder = [\"xformOp:translate\"]");
    w.close();
    Ok(())
}

fn write_material(w: &mut UsdWriter, scope: &str, name: &str, material: &Material) -> UsdResult<()> {
    let context = format!("material '{}'", material.id);
    w.open("Material", name);
    w.line(&format!(
        "custom string exhibit:materialId = {}",
        quote(&material.id)
    ));
    w.line(&format!(
        "token outputs:surface.connect = </World/{}/{}/PreviewSurface.outputs:surface>",
        scope, name
    ));
    w.open("Shader", "PreviewSurface");
    w.line("uniform token info:id = \"UsdPreviewSurface\"");
    w.line(&format!(
        "color3f inputs:diffuseColor = {}",
        color(material.diffuse_color, &context)?
    ));
    w.line(&format!(
        "float inputs:roughness = {}",
        num(material.roughness, &context)?
    ));
    w.line(&format!(
        "float inputs:metallic = {}",
        num(material.metallic, &context)?
    ));
    w.line(&format!(
        "color3f inputs:emissiveColor = {}",
        color(material.emission, &context)?
    ));
    w.line("token outputs:surface");
    w.close();
    w.close();
    Ok(())
}

/// Format a finite number, writing negative zero as `0`.
fn num(v: f64, context: &str) -> UsdResult<String> {
    if !v.is_finite() {
        return Err(UsdError::NonFinite(context.to_string()));
    }
    let v = if v == 0.0 { 0.0 } else { v };
    Ok(format!("{}", v))
}

fn vec3(v: Vec3, context: &str) -> UsdResult<String> {
    Ok(format!(
        "({}, {}, {})",
        num(v.x, context)?,
        num(v.y, context)?,
        num(v.z, context)?
    ))
}

fn color(c: Color, context: &str) -> UsdResult<String> {
    vec3(Vec3::new(c.r, c.g, c.b), context)
}

/// Quote and escape a string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Reduce an arbitrary id to a valid prim identifier.
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Hands out sibling prim names, suffixing repeats so siblings stay unique.
#[derive(Default)]
struct PrimNames {
    used: BTreeSet<String>,
}

impl PrimNames {
    fn claim(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while !self.used.insert(name.clone()) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        name
    }
}

#[derive(Default)]
struct UsdWriter {
    out: String,
    depth: usize,
}

impl UsdWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn open(&mut self, prim_type: &str, name: &str) {
        self.line(&format!("def {} \"{}\"", prim_type, name));
        self.line("{");
        self.indent();
    }

    fn close(&mut self) {
        self.dedent();
        self.line("}");
    }

    fn finish(self) -> String {
        self.out
    }
}
