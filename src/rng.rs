//! The single random source behind every stochastic decision.
//!
//! Spawn jitter, floater direction changes, the connection override branch,
//! rebuild throttling, explosion jitter and staggered reset delays all draw
//! from one [`SimRng`]. Seed it and the whole simulation replays exactly.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seedable random number source with helpers for common draws.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: SmallRng,
}

impl SimRng {
    /// Deterministic source for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Non-deterministic source seeded from the OS.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Seeded if `seed` is given, otherwise from entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform in `0.0..1.0`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform in `-span/2..span/2`.
    #[inline]
    pub fn signed(&mut self, span: f32) -> f32 {
        (self.random() - 0.5) * span
    }

    /// Uniform in `min..max`. Degenerate ranges return `min`.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// True with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.random() < p
    }

    /// Vector with each component drawn from [`SimRng::signed`].
    pub fn signed_vec3(&mut self, span: f32) -> Vec3 {
        let x = self.signed(span);
        let y = self.signed(span);
        let z = self.signed(span);
        Vec3::new(x, y, z)
    }

    /// Vector with each component drawn from `-span[i]/2..span[i]/2`.
    pub fn in_box(&mut self, span: Vec3) -> Vec3 {
        let x = self.signed(span.x);
        let y = self.signed(span.y);
        let z = self.signed(span.z);
        Vec3::new(x, y, z)
    }

    /// Uniformly distributed point on a sphere surface.
    ///
    /// Azimuth is uniform; the polar angle uses the inverse cosine of a
    /// uniform value so points don't bunch at the poles.
    pub fn on_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.random() * TAU;
        let phi = (self.random() * 2.0 - 1.0).clamp(-1.0, 1.0).acos();

        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }
}
