//! The particle swarm: positions, velocities and per-particle visual state.

use glam::Vec3;

use crate::color::hsl_to_rgb;
use crate::config::{InteractionConfig, ParticleConfig};
use crate::floater::Floater;
use crate::math::{ease, VecExt};
use crate::rng::SimRng;

/// A small body in the main swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    /// Set once at creation.
    original_position: Vec3,
    pub velocity: Vec3,
    pub current_scale: f32,
    /// Written only by the interaction controller and scheduled resets.
    pub target_scale: f32,
    /// Fixed offset into the pulse and colour cycles.
    pub color_phase: f32,
    /// Radians per tick.
    pub rotation_speed: f32,
    pub rotation: f32,
    /// Index into the theme palette.
    pub theme_index: usize,
    /// Current sRGB colour.
    pub color: Vec3,
    /// Current emissive sRGB colour.
    pub emissive: Vec3,
}

impl Particle {
    /// Anchor the restoring force pulls toward.
    #[inline]
    pub fn original_position(&self) -> Vec3 {
        self.original_position
    }
}

/// Shared read-only inputs for one particle step.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    /// Scaled simulation time in seconds.
    pub time: f32,
    /// Pointer projected into world space.
    pub pointer: Vec3,
    pub floaters: &'a [Floater],
}

/// Owns every particle.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    /// Place `config.count` particles on a jittered spherical shell.
    ///
    /// Colours cycle through the theme by index.
    pub fn initialize(config: &ParticleConfig, rng: &mut SimRng) -> Self {
        let palette_len = config.theme.len().max(1);
        let particles = (0..config.count)
            .map(|i| {
                let radius = config.shell_radius + rng.signed(config.shell_jitter);
                let position = rng.on_sphere(radius);
                let velocity = rng.signed_vec3(config.initial_speed);
                let rotation_speed = rng.signed(config.max_rotation_speed * 2.0);
                let color_phase = rng.random() * std::f32::consts::TAU;

                let theme_index = i % palette_len;
                let color = config
                    .theme
                    .get(theme_index)
                    .map(|c| c.to_rgb())
                    .unwrap_or(Vec3::ONE);

                Particle {
                    position,
                    original_position: position,
                    velocity,
                    current_scale: 1.0,
                    target_scale: 1.0,
                    color_phase,
                    rotation_speed,
                    rotation: 0.0,
                    theme_index,
                    color,
                    emissive: color * 0.5,
                }
            })
            .collect();

        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Mutable access for the interaction controller and tests.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    /// Set one particle's target scale. Out-of-range indices are ignored.
    pub fn set_target_scale(&mut self, index: usize, scale: f32) {
        if let Some(p) = self.particles.get_mut(index) {
            p.target_scale = scale;
        }
    }

    /// Reset every target scale to 1.
    pub fn reset_target_scales(&mut self) {
        for p in &mut self.particles {
            p.target_scale = 1.0;
        }
    }

    /// Advance every particle by one tick.
    ///
    /// Each particle reads only its own state plus the shared inputs, so
    /// iteration order does not matter.
    pub fn step(&mut self, inputs: StepInputs<'_>, config: &ParticleConfig, interaction: &InteractionConfig) {
        for particle in &mut self.particles {
            step_particle(particle, &inputs, config, interaction);
        }
    }
}

fn step_particle(
    p: &mut Particle,
    inputs: &StepInputs<'_>,
    config: &ParticleConfig,
    interaction: &InteractionConfig,
) {
    let t = inputs.time;

    p.position += p.velocity;
    p.velocity *= config.damping;

    // Constant-magnitude push away from the pointer
    if p.position.distance(inputs.pointer) < interaction.repulsion_radius {
        p.velocity += inputs.pointer.direction_to(p.position) * interaction.repulsion_strength;
    }

    let anchor = p.original_position;
    if p.position.distance(anchor) > config.restore_epsilon {
        p.velocity += p.position.direction_to(anchor) * config.return_strength;
    }

    p.rotation += p.rotation_speed;

    let pulse = (t * config.pulse_frequency + p.color_phase).sin() * config.pulse_amplitude + 1.0;
    p.current_scale = ease(p.current_scale, p.target_scale * pulse, config.smoothing);

    if let Some(base) = config.theme.get(p.theme_index) {
        let hue = base.h + (t + p.color_phase).sin() * config.hue_wobble;
        let lightness = base.l / 100.0 + (t * 2.0).sin() * config.lightness_wobble;
        let target = hsl_to_rgb(hue / 360.0, base.s / 100.0, lightness);
        p.color = p.color.lerp(target, config.smoothing);
        p.emissive = p.emissive.lerp(target * 0.5, config.smoothing);
    }

    if let Some((floater, distance)) = nearest_floater(p.position, inputs.floaters) {
        if distance < config.capture_radius {
            p.velocity += p.position.direction_to(floater.position) * config.attraction;
        }
    }

    if !(p.position.is_finite() && p.velocity.is_finite()) {
        log::warn!("particle state became non-finite, restoring to anchor");
        p.position = p.position.finite_or(anchor);
        p.velocity = p.velocity.finite_or(Vec3::ZERO);
    }
    p.velocity = p.velocity.limit(config.max_speed);
}

/// The floater closest to `point`, with its distance.
pub fn nearest_floater(point: Vec3, floaters: &[Floater]) -> Option<(&Floater, f32)> {
    floaters
        .iter()
        .map(|f| (f, f.position.distance(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, FloaterConfig};
    use crate::floater::FloaterStore;

    fn quiet_inputs(floaters: &[Floater]) -> StepInputs<'_> {
        StepInputs {
            time: 0.0,
            pointer: Vec3::splat(1000.0),
            floaters,
        }
    }

    fn single(position: Vec3, velocity: Vec3) -> ParticleStore {
        let mut config = ParticleConfig::default();
        config.count = 1;
        let mut store = ParticleStore::initialize(&config, &mut SimRng::seeded(0));
        let p = store.get_mut(0).unwrap();
        p.position = position;
        p.original_position = position;
        p.velocity = velocity;
        store
    }

    #[test]
    fn test_initialize_on_shell() {
        let config = ParticleConfig::default();
        let store = ParticleStore::initialize(&config, &mut SimRng::seeded(1));
        assert_eq!(store.len(), 150);

        let half = config.shell_jitter * 0.5;
        for (i, p) in store.iter().enumerate() {
            let r = p.position.length();
            assert!(r >= config.shell_radius - half - 1e-3 && r <= config.shell_radius + half + 1e-3);
            assert_eq!(p.original_position(), p.position);
            assert_eq!(p.theme_index, i % config.theme.len());
            assert!(p.velocity.abs().max_element() <= config.initial_speed * 0.5);
            assert!(p.rotation_speed.abs() <= config.max_rotation_speed);
        }
    }

    #[test]
    fn test_initialize_is_deterministic() {
        let config = ParticleConfig::default();
        let a = ParticleStore::initialize(&config, &mut SimRng::seeded(9));
        let b = ParticleStore::initialize(&config, &mut SimRng::seeded(9));
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_integrate_then_damp() {
        let config = FieldConfig::default();
        let mut store = single(Vec3::new(20.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        store.step(quiet_inputs(&[]), &config.particles, &config.interaction);

        let p = store.get(0).unwrap();
        assert_eq!(p.position, Vec3::new(20.0, 1.0, 0.0));
        // Damped, then pulled back toward the anchor below
        let expected = Vec3::new(0.0, 0.99, 0.0) + Vec3::new(0.0, -1.0, 0.0) * 0.01;
        assert!((p.velocity - expected).length() < 1e-5);
    }

    #[test]
    fn test_pointer_repulsion_is_constant_magnitude() {
        let config = FieldConfig::default();
        let mut store = single(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);
        let inputs = StepInputs {
            time: 0.0,
            pointer: Vec3::ZERO,
            floaters: &[],
        };
        store.step(inputs, &config.particles, &config.interaction);
        let v = store.get(0).unwrap().velocity;
        assert!((v.x - config.interaction.repulsion_strength).abs() < 1e-6);
    }

    #[test]
    fn test_anchor_never_moves() {
        let config = FieldConfig::default();
        let mut store = ParticleStore::initialize(&config.particles, &mut SimRng::seeded(2));
        let anchors: Vec<Vec3> = store.iter().map(|p| p.original_position()).collect();
        for tick in 0..100 {
            let inputs = StepInputs {
                time: tick as f32 * 0.01,
                pointer: Vec3::ZERO,
                floaters: &[],
            };
            store.step(inputs, &config.particles, &config.interaction);
        }
        for (p, a) in store.iter().zip(anchors) {
            assert_eq!(p.original_position(), a);
        }
    }

    #[test]
    fn test_scale_eases_toward_target() {
        let config = FieldConfig::default();
        let mut store = single(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO);
        store.set_target_scale(0, 2.0);
        for _ in 0..300 {
            store.step(quiet_inputs(&[]), &config.particles, &config.interaction);
        }
        let p = store.get(0).unwrap();
        // Pulse stays within its amplitude around the target
        assert!((p.current_scale - 2.0).abs() <= 2.0 * config.particles.pulse_amplitude + 1e-2);
    }

    #[test]
    fn test_rotation_advances_by_speed() {
        let config = FieldConfig::default();
        let mut store = single(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO);
        store.get_mut(0).unwrap().rotation_speed = 0.0125;
        let start = store.get(0).unwrap().rotation;
        for tick in 1..=4 {
            store.step(quiet_inputs(&[]), &config.particles, &config.interaction);
            let expected = start + 0.0125 * tick as f32;
            assert!((store.get(0).unwrap().rotation - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_color_eases_toward_wobbling_theme() {
        let config = FieldConfig::default();
        let pc = &config.particles;
        let mut store = single(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO);
        let (before, emissive_before, phase, base) = {
            let p = store.get_mut(0).unwrap();
            p.color = Vec3::ZERO;
            p.emissive = Vec3::ONE;
            (p.color, p.emissive, p.color_phase, pc.theme[p.theme_index])
        };

        let t = 1.3;
        let inputs = StepInputs {
            time: t,
            pointer: Vec3::splat(1000.0),
            floaters: &[],
        };
        store.step(inputs, pc, &config.interaction);

        let hue = base.h + (t + phase).sin() * pc.hue_wobble;
        let lightness = base.l / 100.0 + (t * 2.0).sin() * pc.lightness_wobble;
        let target = hsl_to_rgb(hue / 360.0, base.s / 100.0, lightness);

        let p = store.get(0).unwrap();
        let color = before + (target - before) * pc.smoothing;
        let emissive = emissive_before + (target * 0.5 - emissive_before) * pc.smoothing;
        assert!((p.color - color).length() < 1e-5, "{:?} != {:?}", p.color, color);
        assert!((p.emissive - emissive).length() < 1e-5, "{:?} != {:?}", p.emissive, emissive);
    }

    #[test]
    fn test_floater_capture() {
        let config = FieldConfig::default();
        let mut rng = SimRng::seeded(3);
        let mut floaters = FloaterStore::initialize(&FloaterConfig::default(), &mut rng);
        floaters.get_mut(0).unwrap().position = Vec3::new(22.0, 0.0, 0.0);
        for i in 1..floaters.len() {
            floaters.get_mut(i).unwrap().position = Vec3::splat(-100.0);
        }

        let mut store = single(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO);
        store.step(quiet_inputs(floaters.as_slice()), &config.particles, &config.interaction);
        let v = store.get(0).unwrap().velocity;
        assert!((v.x - config.particles.attraction).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_state_recovered() {
        let config = FieldConfig::default();
        let mut store = single(Vec3::new(20.0, 0.0, 0.0), Vec3::new(f32::INFINITY, 0.0, 0.0));
        store.step(quiet_inputs(&[]), &config.particles, &config.interaction);
        let p = store.get(0).unwrap();
        assert!(p.position.is_finite());
        assert!(p.velocity.is_finite());
        assert!(p.velocity.length() <= config.particles.max_speed);
    }

    #[test]
    fn test_hover_helpers() {
        let config = ParticleConfig::default();
        let mut store = ParticleStore::initialize(&config, &mut SimRng::seeded(4));
        store.set_target_scale(3, 2.0);
        store.set_target_scale(10_000, 2.0);
        assert_eq!(store.get(3).unwrap().target_scale, 2.0);
        store.reset_target_scales();
        assert!(store.iter().all(|p| p.target_scale == 1.0));
    }

    #[test]
    fn test_zero_particles() {
        let mut config = FieldConfig::default();
        config.particles.count = 0;
        let mut store = ParticleStore::initialize(&config.particles, &mut SimRng::seeded(5));
        store.step(quiet_inputs(&[]), &config.particles, &config.interaction);
        assert!(store.is_empty());
    }
}
