//! Short-lived effects advanced once per tick.
//!
//! Nothing here schedules callbacks: each effect is a small state machine
//! stepped by the frame driver, so a test can replay N ticks exactly.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::config::ShockwaveConfig;
use crate::particle::ParticleStore;

/// Opacity at or below which a shockwave counts as faded.
///
/// Repeated f32 subtraction of the decay step lands a hair above zero.
pub const FADE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShockwavePhase {
    Growing,
    /// Terminal.
    Faded,
}

/// Expanding, fading ring spawned by a click.
#[derive(Debug, Clone, PartialEq)]
pub struct Shockwave {
    pub id: u64,
    pub center: Vec3,
    pub radius: f32,
    pub opacity: f32,
    pub phase: ShockwavePhase,
}

impl Shockwave {
    pub fn new(id: u64, center: Vec3, config: &ShockwaveConfig) -> Self {
        Self {
            id,
            center,
            radius: config.initial_radius,
            opacity: config.initial_opacity,
            phase: ShockwavePhase::Growing,
        }
    }

    /// One tick of growth and decay. Returns the phase after the tick.
    pub fn advance(&mut self, config: &ShockwaveConfig) -> ShockwavePhase {
        if self.phase == ShockwavePhase::Growing {
            self.radius += config.growth;
            self.opacity = (self.opacity - config.decay).max(0.0);
            if self.opacity <= FADE_EPSILON {
                self.opacity = 0.0;
                self.phase = ShockwavePhase::Faded;
            }
        }
        self.phase
    }
}

/// What changed during one [`EffectSet::advance`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectReport {
    /// Shockwaves that faded and were removed this tick.
    pub retired_shockwaves: Vec<u64>,
    /// Particles whose target scale returned to 1 this tick.
    pub scale_resets: Vec<usize>,
}

/// Every active shockwave and pending per-particle scale reset.
#[derive(Debug, Clone, Default)]
pub struct EffectSet {
    shockwaves: Vec<Shockwave>,
    /// Seconds until each particle's target scale returns to 1.
    /// Keyed by particle index; a newer schedule replaces the older one.
    scale_resets: BTreeMap<usize, f32>,
    next_id: u64,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shockwaves(&self) -> &[Shockwave] {
        &self.shockwaves
    }

    /// Remaining delay for a particle's pending reset, if any.
    pub fn pending_reset(&self, particle: usize) -> Option<f32> {
        self.scale_resets.get(&particle).copied()
    }

    pub fn pending_reset_count(&self) -> usize {
        self.scale_resets.len()
    }

    pub fn is_idle(&self) -> bool {
        self.shockwaves.is_empty() && self.scale_resets.is_empty()
    }

    /// Start a new shockwave at `center` and return its id.
    pub fn spawn_shockwave(&mut self, center: Vec3, config: &ShockwaveConfig) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.shockwaves.push(Shockwave::new(id, center, config));
        log::debug!("shockwave {} spawned at {:?}", id, center);
        id
    }

    /// Schedule `particle`'s target scale to return to 1 after `delay` seconds.
    pub fn schedule_scale_reset(&mut self, particle: usize, delay: f32) {
        self.scale_resets.insert(particle, delay.max(0.0));
    }

    /// Advance every effect by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f32, config: &ShockwaveConfig, particles: &mut ParticleStore) -> EffectReport {
        let mut report = EffectReport::default();

        self.shockwaves.retain_mut(|wave| match wave.advance(config) {
            ShockwavePhase::Growing => true,
            ShockwavePhase::Faded => {
                report.retired_shockwaves.push(wave.id);
                false
            }
        });

        self.scale_resets.retain(|&index, remaining| {
            *remaining -= dt;
            if *remaining > 0.0 {
                return true;
            }
            particles.set_target_scale(index, 1.0);
            report.scale_resets.push(index);
            false
        });

        report
    }

    /// Drop every active effect. Particles with a pending reset return to scale 1 at once.
    pub fn cancel_all(&mut self, particles: &mut ParticleStore) {
        if !self.is_idle() {
            log::debug!(
                "cancelling {} shockwaves and {} pending scale resets",
                self.shockwaves.len(),
                self.scale_resets.len()
            );
        }
        self.shockwaves.clear();
        for index in std::mem::take(&mut self.scale_resets).into_keys() {
            particles.set_target_scale(index, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticleConfig;
    use crate::rng::SimRng;

    fn particles(count: usize) -> ParticleStore {
        let mut config = ParticleConfig::default();
        config.count = count;
        ParticleStore::initialize(&config, &mut SimRng::seeded(0))
    }

    #[test]
    fn test_shockwave_fades_in_forty_ticks() {
        let config = ShockwaveConfig::default();
        let mut wave = Shockwave::new(0, Vec3::ZERO, &config);
        for tick in 1..=40 {
            let phase = wave.advance(&config);
            if tick < 40 {
                assert_eq!(phase, ShockwavePhase::Growing, "faded early at tick {tick}");
                assert!(wave.opacity > 0.0);
            } else {
                assert_eq!(phase, ShockwavePhase::Faded);
            }
        }
        assert_eq!(wave.opacity, 0.0);
        assert!((wave.radius - (0.5 + 40.0 * 0.2)).abs() < 1e-3);

        // Terminal
        let radius = wave.radius;
        wave.advance(&config);
        assert_eq!(wave.radius, radius);
    }

    #[test]
    fn test_effect_set_retires_shockwaves_independently() {
        let config = ShockwaveConfig::default();
        let mut store = particles(0);
        let mut effects = EffectSet::new();
        let first = effects.spawn_shockwave(Vec3::ZERO, &config);
        for _ in 0..10 {
            effects.advance(0.016, &config, &mut store);
        }
        let second = effects.spawn_shockwave(Vec3::X, &config);
        assert_ne!(first, second);

        let mut retired = Vec::new();
        for _ in 0..40 {
            retired.extend(effects.advance(0.016, &config, &mut store).retired_shockwaves);
        }
        assert_eq!(retired, vec![first, second]);
        assert!(effects.shockwaves().is_empty());
    }

    #[test]
    fn test_scale_reset_fires_after_delay() {
        let config = ShockwaveConfig::default();
        let mut store = particles(3);
        store.set_target_scale(1, 1.5);
        let mut effects = EffectSet::new();
        effects.schedule_scale_reset(1, 0.5);

        let report = effects.advance(0.3, &config, &mut store);
        assert!(report.scale_resets.is_empty());
        assert_eq!(store.get(1).unwrap().target_scale, 1.5);

        let report = effects.advance(0.3, &config, &mut store);
        assert_eq!(report.scale_resets, vec![1]);
        assert_eq!(store.get(1).unwrap().target_scale, 1.0);
        assert!(effects.is_idle());
    }

    #[test]
    fn test_later_schedule_supersedes() {
        let config = ShockwaveConfig::default();
        let mut store = particles(1);
        store.set_target_scale(0, 1.5);
        let mut effects = EffectSet::new();
        effects.schedule_scale_reset(0, 0.5);
        effects.advance(0.4, &config, &mut store);

        // Second explosion before the first reset fires
        effects.schedule_scale_reset(0, 1.0);
        assert_eq!(effects.pending_reset_count(), 1);

        effects.advance(0.4, &config, &mut store);
        assert_eq!(store.get(0).unwrap().target_scale, 1.5);
        effects.advance(0.7, &config, &mut store);
        assert_eq!(store.get(0).unwrap().target_scale, 1.0);
    }

    #[test]
    fn test_cancel_all() {
        let config = ShockwaveConfig::default();
        let mut store = particles(1);
        store.set_target_scale(0, 1.5);
        let mut effects = EffectSet::new();
        effects.spawn_shockwave(Vec3::ZERO, &config);
        effects.schedule_scale_reset(0, 0.1);
        effects.cancel_all(&mut store);
        assert_eq!(store.get(0).unwrap().target_scale, 1.0);

        store.set_target_scale(0, 1.5);
        effects.cancel_all(&mut store);
        assert!(effects.is_idle());

        let report = effects.advance(1.0, &config, &mut store);
        assert_eq!(report, EffectReport::default());
        assert_eq!(store.get(0).unwrap().target_scale, 1.5);
    }
}
