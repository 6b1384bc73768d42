use glam::Vec3;

use super::entity::Entity;
use super::label::LabelRegistry;
use super::registry::NodeRegistry;
use super::settings::ForceSettings;
use super::visibility::first_shared_visible_label;

const BOUND_VELOCITY_RETENTION: f32 = 0.5;
const MOTION_EPSILON_SQ: f32 = 1.0e-12;

/// Force on the entity at `from` exerted by the entity at `to`. The entity at
/// `to` receives the negation. `None` when the two coincide.
///
/// Connected pairs act as a spring with rest length `ideal_distance`: stretched
/// springs pull together, compressed ones push apart. Unconnected pairs push
/// apart with `repulsion_coefficient / d²`. A magnitude that overflows `f32`
/// saturates along the separation, so the result is always finite.
pub fn pair_force(from: Vec3, to: Vec3, connected: bool, settings: &ForceSettings) -> Option<Vec3> {
    let delta = to - from;
    let distance = delta.length();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }

    let direction = delta / distance;
    if !direction.is_finite() {
        return None;
    }

    let magnitude = if connected {
        settings.spring_constant * (distance - settings.ideal_distance)
    } else {
        // d² underflows to zero well before d does
        -settings.repulsion_coefficient / (distance * distance).max(f32::MIN_POSITIVE)
    };
    let magnitude = magnitude.clamp(-f32::MAX, f32::MAX);
    Some(clamp_length(direction * magnitude, f32::MAX))
}

/// Rescales `value` down to `max_length` if it is longer, keeping its
/// direction. The result never exceeds `max_length`.
///
/// Infinite components keep their sign and dominate the direction; a vector
/// with no direction left (all NaN) comes back as zero.
pub fn clamp_length(value: Vec3, max_length: f32) -> Vec3 {
    let length = value.length();
    if length <= max_length {
        return value;
    }
    if max_length <= 0.0 {
        return Vec3::ZERO;
    }
    if !max_length.is_finite() {
        // only NaN gets here; the caller decides what that means
        return value;
    }

    let direction = if value.is_finite() {
        // length may still overflow; scale by the largest component first
        let largest = value.abs().max_element();
        (value / largest).normalize_or_zero()
    } else {
        let axis = |component: f32| {
            if component.is_infinite() {
                component.signum()
            } else {
                0.0
            }
        };
        Vec3::new(axis(value.x), axis(value.y), axis(value.z)).normalize_or_zero()
    };

    // rounding can land a few ulps past the limit; step the target down
    let overshoots = |scaled: Vec3| {
        let length = scaled.length();
        length.is_finite() && length > max_length
    };
    let mut target = max_length;
    let mut scaled = direction * target;
    while overshoots(scaled) && target > 0.0 {
        target = f32::from_bits(target.to_bits() - 1);
        scaled = direction * target;
    }
    scaled
}

/// One semi-implicit Euler step with unit mass. Expects sanitized settings.
///
/// Returns the new `(position, velocity)`. Speed never exceeds
/// `max_velocity`, even when the force overflowed; a position pushed past
/// `max_bound_radius` is pulled back onto the bounding sphere and loses half
/// its velocity.
pub fn integrate(
    position: Vec3,
    velocity: Vec3,
    force: Vec3,
    settings: &ForceSettings,
    dt: f32,
) -> (Vec3, Vec3) {
    let mut velocity = clamp_length(
        (velocity + force * dt) * settings.damping,
        settings.max_velocity,
    );
    if !velocity.is_finite() {
        log::warn!("non-finite velocity from force {force:?}; resetting to rest");
        velocity = Vec3::ZERO;
    }

    let mut next = position + velocity * dt;
    if !next.is_finite() {
        next = position;
    }

    if next.length() > settings.max_bound_radius {
        next = clamp_length(next, settings.max_bound_radius);
        velocity *= BOUND_VELOCITY_RETENTION;
    }

    (next, velocity)
}

#[derive(Default)]
struct ForceScratch {
    members: Vec<usize>,
    slots: Vec<usize>,
    positions: Vec<Vec3>,
    forces: Vec<Vec3>,
}

/// Pairwise force accumulation and integration over the active set.
#[derive(Default)]
pub struct ForceEngine {
    scratch: ForceScratch,
}

impl ForceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every active entity by `dt`. All pair forces are read from
    /// start-of-step positions before anything moves, so iteration order has
    /// no effect. Returns whether anything is still moving.
    pub fn step(
        &mut self,
        nodes: &mut NodeRegistry,
        active: &[&Entity],
        labels: &LabelRegistry,
        settings: &ForceSettings,
        dt: f32,
    ) -> bool {
        let settings = settings.sanitized();
        let scratch = &mut self.scratch;
        scratch.members.clear();
        scratch.slots.clear();
        scratch.positions.clear();

        for (member, entity) in active.iter().enumerate() {
            let Some(slot) = nodes.index_of(&entity.id) else {
                continue;
            };
            nodes.ensure_velocity_at(slot);
            scratch.members.push(member);
            scratch.slots.push(slot);
            scratch.positions.push(nodes.state_at(slot).0);
        }

        if !(dt.is_finite() && dt > 0.0) {
            return false;
        }

        let count = scratch.slots.len();
        scratch.forces.clear();
        scratch.forces.resize(count, Vec3::ZERO);

        let members = &scratch.members;
        let positions = &scratch.positions;
        let forces = &mut scratch.forces;

        for i in 0..count {
            let first = active[members[i]];
            for j in (i + 1)..count {
                let second = active[members[j]];
                let connected = first_shared_visible_label(first, second, labels).is_some();
                if let Some(force) = pair_force(positions[i], positions[j], connected, &settings) {
                    forces[i] += force;
                    forces[j] -= force;
                }
            }
        }

        for (force, position) in forces.iter_mut().zip(positions.iter()) {
            *force -= *position * settings.center_strength;
        }

        let mut any_motion = false;
        for (index, &slot) in scratch.slots.iter().enumerate() {
            let (position, velocity) = nodes.state_at(slot);
            let (position, velocity) =
                integrate(position, velocity, forces[index], &settings, dt);
            nodes.write_state_at(slot, position, velocity);
            any_motion |= velocity.length_squared() > MOTION_EPSILON_SQ;
        }

        any_motion
    }
}
