//! Wall-clock frame timing for the host loop.
//!
//! The simulation itself never reads the wall clock: the host measures the
//! frame delta here and hands it to [`ParticleField::frame`](crate::ParticleField::frame),
//! so tests can drive the same code with a fixed delta.
//!
//! # Example
//!
//! ```
//! use particle_field::time::Time;
//!
//! let mut time = Time::new();
//! time.set_fixed_delta(Some(1.0 / 60.0));
//!
//! let (_elapsed, delta) = time.update();
//! assert!((delta - 1.0 / 60.0).abs() < 1e-6);
//! assert_eq!(time.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Longest delta handed to the simulation in one frame.
///
/// A window that was minimized or dragged can stall for seconds; timers
/// should not all fire on the first frame back.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Frame timing: elapsed time, delta time, frame count and FPS.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
        }
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience. The delta is
    /// capped at [`MAX_FRAME_DELTA`].
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta).min(MAX_FRAME_DELTA);
        self.last_frame = now;
        self.elapsed_secs = now.duration_since(self.start).as_secs_f32();
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Use a fixed delta instead of real frame timing. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Reset the timer to its initial state.
    ///
    /// Called when the frame driver restarts so the first delta after a
    /// pause doesn't include the stopped interval.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_frame = now;
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.delta(), 0.0);
    }

    #[test]
    fn test_time_update() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(100));
        time.update();

        // Should use fixed delta regardless of actual time
        let expected = 1.0 / 60.0;
        assert!((time.delta() - expected).abs() < 0.0001);
    }

    #[test]
    fn test_delta_is_capped() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(3.0));
        time.update();
        assert_eq!(time.delta(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_fps_measured_over_interval() {
        let mut time = Time::new();
        time.fps_update_interval = Duration::ZERO;
        thread::sleep(Duration::from_millis(10));
        time.update();
        // One frame over at least 10ms
        assert!(time.fps() > 0.0 && time.fps() <= 100.0);
    }

    #[test]
    fn test_reset() {
        let mut time = Time::new();
        time.update();
        time.update();
        time.reset();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.elapsed(), 0.0);
    }
}
