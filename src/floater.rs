//! Floaters: a handful of larger bodies wandering inside a reflecting box.
//!
//! Floaters never join the connection graph. Particles read their positions
//! (for the weak capture attraction) but nothing ever writes to a floater
//! except its own store.

use glam::Vec3;

use crate::color::hsl_to_rgb;
use crate::config::FloaterConfig;
use crate::math::VecExt;
use crate::rng::SimRng;

/// A single wandering body.
#[derive(Debug, Clone, PartialEq)]
pub struct Floater {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    /// Per-axis angular velocity in radians per tick.
    pub angular_velocity: Vec3,
    /// Normalized hue assigned at creation.
    pub hue: f32,
    /// sRGB colour derived from `hue`.
    pub base_color: Vec3,
}

/// Owns every floater and their motion.
#[derive(Debug, Clone, Default)]
pub struct FloaterStore {
    floaters: Vec<Floater>,
}

impl FloaterStore {
    /// Spawn `config.count` floaters with evenly spread hues.
    pub fn initialize(config: &FloaterConfig, rng: &mut SimRng) -> Self {
        let count = config.count;
        let floaters = (0..count)
            .map(|i| {
                let hue = i as f32 / count as f32;
                let position = rng.in_box(config.spawn_extent);
                let rotation = Vec3::new(
                    rng.random() * std::f32::consts::PI,
                    rng.random() * std::f32::consts::PI,
                    0.0,
                );
                let velocity = rng.signed_vec3(config.initial_speed).limit(config.max_speed);
                let angular_velocity = rng.signed_vec3(config.angular_speed);

                Floater {
                    position,
                    velocity,
                    rotation,
                    angular_velocity,
                    hue,
                    base_color: hsl_to_rgb(hue, config.saturation, config.lightness),
                }
            })
            .collect();

        Self { floaters }
    }

    pub fn len(&self) -> usize {
        self.floaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floaters.is_empty()
    }

    pub fn as_slice(&self) -> &[Floater] {
        &self.floaters
    }

    pub fn iter(&self) -> impl Iterator<Item = &Floater> {
        self.floaters.iter()
    }

    /// Mutable access for tests and scripted scenes.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Floater> {
        self.floaters.get_mut(index)
    }

    /// Advance every floater by one tick.
    ///
    /// Order per floater: integrate, maybe pick a new direction, bounce off
    /// the walls, rotate, pointer repulsion, jitter, then the hard speed
    /// clamp so `|velocity| <= max_speed` holds after every step.
    pub fn step(&mut self, pointer: Vec3, config: &FloaterConfig, rng: &mut SimRng) {
        let bounds = config.bounds;

        for floater in &mut self.floaters {
            floater.position += floater.velocity;

            if rng.chance(config.direction_change_chance) {
                floater.velocity = rng.signed_vec3(config.initial_speed);
            }

            for axis in 0..3 {
                let limit = bounds[axis];
                let p = floater.position[axis];
                if p.abs() > limit {
                    // Reflect inward; a velocity already pointing inward is left alone
                    if p * floater.velocity[axis] > 0.0 {
                        floater.velocity[axis] = -floater.velocity[axis];
                    }
                    floater.position[axis] = p.clamp(-limit, limit);
                }
            }

            floater.rotation += floater.angular_velocity;

            let distance = floater.position.distance(pointer);
            if distance < config.repulsion_radius {
                let away = pointer.direction_to(floater.position);
                floater.velocity += away * config.repulsion_strength;
            }

            floater.velocity += rng.signed_vec3(config.jitter);
            floater.velocity = floater.velocity.limit(config.max_speed);

            if !floater.position.is_finite() {
                log::warn!("floater position became non-finite, clamping into bounds");
                floater.position = floater.position.finite_or(Vec3::ZERO);
            }
        }
    }
}
