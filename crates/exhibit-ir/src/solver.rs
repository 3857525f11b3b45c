use exhibit_core::math::{Axis, Vec3};
use exhibit_core::SolverConfig;

use crate::spatial::{ConstraintKind, SpatialConstraint, SpatialObject, SpatialSolution};

/// Whether a constraint pass may move objects or only measure them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Apply,
    Evaluate,
}

/// Iterative relaxation solver for spatial constraints.
///
/// Objects and constraints keep their first-seen insertion order; re-adding an
/// id replaces the entry in place. `solve()` works on a copy, so the solver can
/// be solved repeatedly and always produces the same solution for the same
/// inputs.
#[derive(Debug, Clone)]
pub struct SpatialSolver {
    settings: SolverConfig,
    objects: Vec<SpatialObject>,
    constraints: Vec<SpatialConstraint>,
}

impl Default for SpatialSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialSolver {
    pub fn new() -> Self {
        Self::with_settings(SolverConfig::default())
    }

    pub fn with_settings(settings: SolverConfig) -> Self {
        Self {
            settings,
            objects: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SolverConfig {
        &self.settings
    }

    /// Insert an object, replacing any existing object with the same id.
    pub fn add_object(&mut self, object: SpatialObject) {
        match self.objects.iter_mut().find(|o| o.id == object.id) {
            Some(slot) => *slot = object,
            None => self.objects.push(object),
        }
    }

    /// Insert a constraint, replacing any existing constraint with the same id.
    pub fn add_constraint(&mut self, constraint: SpatialConstraint) {
        match self.constraints.iter_mut().find(|c| c.id == constraint.id) {
            Some(slot) => *slot = constraint,
            None => self.constraints.push(constraint),
        }
    }

    /// Remove an object and every constraint that references it.
    pub fn remove_object(&mut self, id: &str) -> Option<SpatialObject> {
        let removed = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .map(|idx| self.objects.remove(idx));
        self.constraints.retain(|c| !c.references(id));
        removed
    }

    pub fn object(&self, id: &str) -> Option<&SpatialObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn constraint(&self, id: &str) -> Option<&SpatialConstraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    pub fn objects(&self) -> &[SpatialObject] {
        &self.objects
    }

    pub fn constraints(&self) -> &[SpatialConstraint] {
        &self.constraints
    }

    /// Relax all enabled constraints until the weighted error drops to the
    /// convergence threshold or the iteration budget runs out.
    pub fn solve(&self) -> SpatialSolution {
        let mut working = self.objects.clone();

        if self.objects.is_empty() || self.constraints.is_empty() {
            return SpatialSolution {
                objects: working,
                constraints_satisfied: Vec::new(),
                constraints_violated: Vec::new(),
                total_error: 0.0,
                iterations: 0,
            };
        }

        let threshold = self.settings.convergence_threshold;
        let mut iterations = 0;
        let mut total_error = f64::INFINITY;

        while iterations < self.settings.max_iterations && total_error > threshold {
            total_error = 0.0;
            for constraint in self.constraints.iter().filter(|c| c.enabled) {
                let error = self.process(constraint, &mut working, Pass::Apply);
                total_error += error * constraint.weight;
            }
            iterations += 1;
        }

        let mut constraints_satisfied = Vec::new();
        let mut constraints_violated = Vec::new();
        for constraint in self.constraints.iter().filter(|c| c.enabled) {
            let residual = self.process(constraint, &mut working, Pass::Evaluate);
            if residual < threshold {
                constraints_satisfied.push(constraint.id.clone());
            } else {
                constraints_violated.push(constraint.id.clone());
            }
        }

        tracing::debug!(
            iterations,
            total_error,
            violated = constraints_violated.len(),
            "spatial solve finished"
        );

        SpatialSolution {
            objects: working,
            constraints_satisfied,
            constraints_violated,
            total_error,
            iterations,
        }
    }

    /// Compute one constraint's error, moving its participants on `Pass::Apply`.
    ///
    /// Constraints whose participant count does not match their kind, or that
    /// name an unknown object, contribute no error and move nothing.
    fn process(
        &self,
        constraint: &SpatialConstraint,
        objects: &mut [SpatialObject],
        pass: Pass,
    ) -> f64 {
        if !constraint.has_valid_arity() {
            return 0.0;
        }
        let damping = self.settings.damping_factor;
        let apply = pass == Pass::Apply;

        match &constraint.kind {
            ConstraintKind::Position { target } => {
                let Some([i]) = resolve::<1>(constraint, objects) else {
                    return 0.0;
                };
                let current = objects[i].position;
                if apply {
                    objects[i].position = current + (*target - current) * damping;
                }
                current.distance(target)
            }

            ConstraintKind::Distance { target } => {
                let Some([i, j]) = resolve::<2>(constraint, objects) else {
                    return 0.0;
                };
                let (a, b) = (objects[i].position, objects[j].position);
                let current = a.distance(&b);
                if apply && current > 0.0 {
                    let direction = (b - a) / current;
                    let correction = (current - target) * damping;
                    objects[i].position = a + direction * correction * 0.5;
                    objects[j].position = b - direction * correction * 0.5;
                }
                (current - target).abs()
            }

            ConstraintKind::Angle { target } => {
                let Some([a, vertex, c]) = resolve::<3>(constraint, objects) else {
                    return 0.0;
                };
                // Never moves participants, on either pass.
                let u = objects[a].position - objects[vertex].position;
                let v = objects[c].position - objects[vertex].position;
                let (len_u, len_v) = (u.length(), v.length());
                if len_u > 0.0 && len_v > 0.0 {
                    let cos = (u.dot(&v) / (len_u * len_v)).clamp(-1.0, 1.0);
                    (cos.acos() - target).abs()
                } else {
                    *target
                }
            }

            ConstraintKind::Alignment { axes } => {
                let members: Vec<usize> = constraint
                    .objects
                    .iter()
                    .filter_map(|id| index_of(objects, id))
                    .collect();
                if members.len() < 2 {
                    return 0.0;
                }

                let mut sum = Vec3::zero();
                for &i in &members {
                    sum = sum + objects[i].position;
                }
                let centroid = sum / members.len() as f64;

                let mut error = 0.0;
                for &i in &members {
                    let mut p = objects[i].position;
                    for axis in axes.axes() {
                        error += (p.get(axis) - centroid.get(axis)).abs();
                        p.set(axis, centroid.get(axis));
                    }
                    if apply {
                        objects[i].position = p;
                    }
                }
                error
            }

            ConstraintKind::Boundary { bounds } => {
                let Some([i]) = resolve::<1>(constraint, objects) else {
                    return 0.0;
                };
                let mut p = objects[i].position;
                let mut error = 0.0;
                for axis in Axis::ALL {
                    let (lo, hi) = (bounds.min.get(axis), bounds.max.get(axis));
                    let value = p.get(axis);
                    if value < lo {
                        error += lo - value;
                        p.set(axis, lo);
                    } else if value > hi {
                        error += value - hi;
                        p.set(axis, hi);
                    }
                }
                if apply {
                    objects[i].position = p;
                }
                error
            }

            ConstraintKind::Collision { min_separation } => {
                let Some([i, j]) = resolve::<2>(constraint, objects) else {
                    return 0.0;
                };
                let (a, b) = (objects[i].position, objects[j].position);
                let current = a.distance(&b);
                if current < *min_separation {
                    if apply && current > 0.0 {
                        let direction = (b - a) / current;
                        let separation = (min_separation - current) * damping;
                        objects[i].position = a - direction * separation * 0.5;
                        objects[j].position = b + direction * separation * 0.5;
                    }
                    min_separation - current
                } else {
                    0.0
                }
            }
        }
    }
}

fn index_of(objects: &[SpatialObject], id: &str) -> Option<usize> {
    objects.iter().position(|o| o.id == id)
}

/// Resolve exactly `N` participants to working-copy indices.
fn resolve<const N: usize>(
    constraint: &SpatialConstraint,
    objects: &[SpatialObject],
) -> Option<[usize; N]> {
    if constraint.objects.len() != N {
        return None;
    }
    let mut indices = [0usize; N];
    for (slot, id) in indices.iter_mut().zip(&constraint.objects) {
        *slot = index_of(objects, id)?;
    }
    Some(indices)
}
