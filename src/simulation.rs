//! The simulation context: every piece of mutable simulation state in one place.
//!
//! Handlers and the frame driver receive a `&mut SimulationContext` instead
//! of capturing shared state, so each mutation point is explicit and the
//! whole simulation runs without any render backend.

use crate::config::FieldConfig;
use crate::connections::ConnectionGraph;
use crate::effects::{EffectReport, EffectSet};
use crate::error::ConfigError;
use crate::floater::FloaterStore;
use crate::input::PointerState;
use crate::particle::{ParticleStore, StepInputs};
use crate::rng::SimRng;

/// What happened during one [`SimulationContext::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Whether the connection graph was rebuilt.
    pub rebuilt: bool,
    pub effects: EffectReport,
}

/// Owns the stores, the edge set, active effects, the pointer and the random source.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub config: FieldConfig,
    pub rng: SimRng,
    pub particles: ParticleStore,
    pub floaters: FloaterStore,
    pub connections: ConnectionGraph,
    pub effects: EffectSet,
    pub pointer: PointerState,
    /// Scaled animation time in seconds.
    elapsed: f32,
    ticks: u64,
}

impl SimulationContext {
    /// Validate `config` and populate both stores.
    pub fn new(config: FieldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = SimRng::from_seed(config.seed);
        let particles = ParticleStore::initialize(&config.particles, &mut rng);
        let floaters = FloaterStore::initialize(&config.floaters, &mut rng);

        Ok(Self {
            config,
            rng,
            particles,
            floaters,
            connections: ConnectionGraph::new(),
            effects: EffectSet::new(),
            pointer: PointerState::default(),
            elapsed: 0.0,
            ticks: 0,
        })
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the simulation by one tick.
    ///
    /// Floaters step first, then particles (reading post-step floaters),
    /// then the connection graph (reading post-step particles), then the
    /// active effects. Forces are applied per tick; `dt` only drives the
    /// animation clock, the quiet period and pending resets.
    pub fn step(&mut self, dt: f32) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt * self.config.scene.time_scale;
        self.ticks += 1;

        let pointer = self.pointer.world_point(&self.config.interaction);

        self.floaters.step(pointer, &self.config.floaters, &mut self.rng);

        let inputs = StepInputs {
            time: self.elapsed,
            pointer,
            floaters: self.floaters.as_slice(),
        };
        self.particles.step(inputs, &self.config.particles, &self.config.interaction);

        let rebuilt = self.connections.update(
            dt,
            self.particles.as_slice(),
            &self.config.connections,
            &mut self.rng,
        );

        let effects = self.effects.advance(dt, &self.config.shockwave, &mut self.particles);

        TickReport { rebuilt, effects }
    }

    /// Cancel every pending timed action. Pending scale resets are applied immediately.
    pub fn cancel_pending(&mut self) {
        self.effects.cancel_all(&mut self.particles);
        self.connections.cancel_quiet_period();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> FieldConfig {
        FieldConfig {
            seed: Some(seed),
            ..FieldConfig::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = seeded(1);
        config.scene.far = 0.0;
        assert!(SimulationContext::new(config).is_err());
    }

    #[test]
    fn test_seeded_runs_replay_exactly() {
        let mut a = SimulationContext::new(seeded(5)).unwrap();
        let mut b = SimulationContext::new(seeded(5)).unwrap();
        for _ in 0..200 {
            assert_eq!(a.step(1.0 / 60.0), b.step(1.0 / 60.0));
        }
        assert_eq!(a.particles.as_slice(), b.particles.as_slice());
        assert_eq!(a.connections.edges(), b.connections.edges());
    }

    #[test]
    fn test_invariants_hold_over_many_ticks() {
        let mut ctx = SimulationContext::new(seeded(8)).unwrap();
        let max_floater = ctx.config.floaters.max_speed;
        let max_particle = ctx.config.particles.max_speed;
        for tick in 0..1000 {
            let t = tick as f32 * 0.05;
            ctx.pointer.set_normalized(glam::Vec2::new(t.sin(), t.cos()));
            ctx.step(1.0 / 60.0);
            for f in ctx.floaters.iter() {
                assert!(f.velocity.length() <= max_floater + 1e-5);
            }
            for p in ctx.particles.iter() {
                assert!(p.position.is_finite() && p.velocity.is_finite());
                assert!(p.velocity.length() <= max_particle + 1e-5);
            }
        }
    }

    #[test]
    fn test_bad_delta_is_ignored() {
        let mut ctx = SimulationContext::new(seeded(2)).unwrap();
        ctx.step(f32::NAN);
        ctx.step(-1.0);
        assert_eq!(ctx.elapsed(), 0.0);
        assert_eq!(ctx.ticks(), 2);
    }

    #[test]
    fn test_time_scale() {
        let mut ctx = SimulationContext::new(seeded(3)).unwrap();
        ctx.step(1.0);
        assert!((ctx.elapsed() - 0.5).abs() < 1e-6);
    }
}
