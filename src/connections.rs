//! Proximity graph between particles.
//!
//! The edge set is never patched: each rebuild scans every unordered pair,
//! derives a fresh list and replaces the old one wholesale. Rebuilds are
//! throttled probabilistically, and an explosion suppresses them for a quiet
//! period while the swarm settles.

use crate::config::ConnectionConfig;
use crate::particle::Particle;
use crate::rng::SimRng;

/// An undirected edge between two particles, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
    /// Line opacity, already scaled down to stay faint.
    pub opacity: f32,
    /// Threshold the pair was accepted against.
    pub threshold: f32,
}

/// Distance cutoff for a pair whose speeds sum to `speed_sum`.
#[inline]
pub fn dynamic_threshold(speed_sum: f32, config: &ConnectionConfig) -> f32 {
    config.base_threshold + speed_sum * config.speed_factor
}

/// Derive the edge set from the current particle snapshot.
///
/// A pair within its dynamic threshold is connected when the two particles
/// are closing in on each other. Pairs that are not closing still connect
/// with probability `override_chance`; that is the only branch that draws
/// from `rng`. Particles are only read.
pub fn build_connections(particles: &[Particle], config: &ConnectionConfig, rng: &mut SimRng) -> Vec<Connection> {
    let mut edges = Vec::new();

    for (a, pa) in particles.iter().enumerate() {
        for (offset, pb) in particles[a + 1..].iter().enumerate() {
            let distance = pa.position.distance(pb.position);
            let speed_sum = pa.velocity.length() + pb.velocity.length();
            let threshold = dynamic_threshold(speed_sum, config);
            if !(distance < threshold) {
                continue;
            }

            let closing = (pa.position - pb.position).dot(pa.velocity - pb.velocity) < 0.0;
            if !closing && !rng.chance(config.override_chance) {
                continue;
            }

            let strength = (speed_sum * config.opacity_speed_weight + (1.0 - distance / threshold)).min(1.0);
            edges.push(Connection {
                a,
                b: a + 1 + offset,
                opacity: strength * config.opacity_scale,
                threshold,
            });
        }
    }

    edges
}

/// The current edge set plus rebuild scheduling.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    edges: Vec<Connection>,
    /// Bumped whenever the edge set changes.
    generation: u64,
    /// Seconds left in the post-explosion quiet period.
    quiet_remaining: Option<f32>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> &[Connection] {
        &self.edges
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet_remaining.is_some()
    }

    /// Replace the edge set from the given snapshot.
    pub fn rebuild(&mut self, particles: &[Particle], config: &ConnectionConfig, rng: &mut SimRng) {
        self.edges = build_connections(particles, config, rng);
        self.generation += 1;
        log::debug!("rebuilt connection graph: {} edges", self.edges.len());
    }

    /// Drop every edge.
    pub fn clear(&mut self) {
        if !self.edges.is_empty() {
            self.edges.clear();
            self.generation += 1;
        }
    }

    /// Clear the edges and suppress rebuilding for `duration` seconds.
    ///
    /// Starting a new quiet period while one is running restarts it.
    pub fn begin_quiet_period(&mut self, duration: f32) {
        self.clear();
        self.quiet_remaining = Some(duration.max(0.0));
        log::debug!("connection quiet period for {:.2}s", duration);
    }

    /// Abandon a pending quiet period without rebuilding.
    pub fn cancel_quiet_period(&mut self) {
        self.quiet_remaining = None;
    }

    /// Per-tick scheduling. Returns true if the graph was rebuilt.
    ///
    /// While quiet, no rebuild happens and nothing is drawn from `rng`. The
    /// tick on which the quiet period expires always rebuilds. Otherwise a
    /// rebuild happens with probability `rebuild_chance`.
    pub fn update(&mut self, dt: f32, particles: &[Particle], config: &ConnectionConfig, rng: &mut SimRng) -> bool {
        if let Some(remaining) = self.quiet_remaining.as_mut() {
            *remaining -= dt;
            if *remaining > 0.0 {
                return false;
            }
            self.quiet_remaining = None;
            self.rebuild(particles, config, rng);
            return true;
        }

        if rng.chance(config.rebuild_chance) {
            self.rebuild(particles, config, rng);
            return true;
        }
        false
    }
}
