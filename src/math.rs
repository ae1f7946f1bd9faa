//! Vector helpers shared by every simulation component.
//!
//! Plain arithmetic (add, subtract, scale, distance, `clamp_length_max`) comes
//! straight from [`glam::Vec3`]. This module adds the few operations the
//! simulation needs on top of that: safe directions, finiteness guards and
//! ray/sphere picking.

use glam::Vec3;

/// Extra operations on [`Vec3`] used by the force model.
pub trait VecExt {
    /// Unit vector pointing from `self` toward `target`.
    ///
    /// Returns [`Vec3::ZERO`] when the two points coincide instead of NaN.
    fn direction_to(self, target: Vec3) -> Vec3;

    /// `self` if every component is finite, otherwise `fallback`.
    fn finite_or(self, fallback: Vec3) -> Vec3;

    /// Scale the vector down so its length does not exceed `max`.
    ///
    /// Non-finite input collapses to zero.
    fn limit(self, max: f32) -> Vec3;
}

impl VecExt for Vec3 {
    #[inline]
    fn direction_to(self, target: Vec3) -> Vec3 {
        (target - self).normalize_or_zero()
    }

    #[inline]
    fn finite_or(self, fallback: Vec3) -> Vec3 {
        if self.is_finite() {
            self
        } else {
            fallback
        }
    }

    #[inline]
    fn limit(self, max: f32) -> Vec3 {
        if !self.is_finite() {
            return Vec3::ZERO;
        }
        self.clamp_length_max(max.max(0.0))
    }
}

/// Exponential smoothing step: move `current` a fixed `factor` of the way to `target`.
#[inline]
pub fn ease(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first hit with a sphere, if any.
    ///
    /// A ray starting inside the sphere reports the exit point.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }
}
