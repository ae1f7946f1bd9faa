//! Tunable constants for the whole field, loadable from JSON.
//!
//! Every section uses `#[serde(default)]`, so a config file only needs to
//! list the values it changes:
//!
//! ```json
//! { "seed": 7, "particles": { "count": 300 }, "connections": { "quiet_period": 1.0 } }
//! ```

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::{default_theme, hex_to_rgb, Hsl};
use crate::error::ConfigError;

/// Swarm of small bodies on a spherical shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Mean radius of the spawn shell.
    pub shell_radius: f32,
    /// Full width of the radial jitter around `shell_radius`.
    pub shell_jitter: f32,
    /// Full width of each initial velocity component.
    pub initial_speed: f32,
    /// World-space radius of a particle at scale 1.
    pub size: f32,
    /// Per-tick velocity multiplier.
    pub damping: f32,
    /// Hard cap on speed, applied after all forces.
    pub max_speed: f32,
    /// Distance from the anchor below which no restoring force applies.
    pub restore_epsilon: f32,
    pub return_strength: f32,
    /// Rotation speeds are drawn from `-max_rotation_speed..max_rotation_speed`.
    pub max_rotation_speed: f32,
    pub pulse_amplitude: f32,
    pub pulse_frequency: f32,
    /// Exponential smoothing factor for scale and colour.
    pub smoothing: f32,
    /// Peak hue offset in degrees.
    pub hue_wobble: f32,
    /// Peak lightness offset (0..1 units).
    pub lightness_wobble: f32,
    pub opacity: f32,
    pub theme: Vec<Hsl>,
    /// Floaters closer than this pull on a particle.
    pub capture_radius: f32,
    pub attraction: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 150,
            shell_radius: 20.0,
            shell_jitter: 8.0,
            initial_speed: 0.02,
            size: 0.2,
            damping: 0.99,
            max_speed: 1.5,
            restore_epsilon: 0.1,
            return_strength: 0.01,
            max_rotation_speed: 0.005,
            pulse_amplitude: 0.05,
            pulse_frequency: 2.0,
            smoothing: 0.05,
            hue_wobble: 20.0,
            lightness_wobble: 0.1,
            opacity: 0.8,
            theme: default_theme(),
            capture_radius: 5.0,
            attraction: 0.001,
        }
    }
}

/// Larger wandering bodies bouncing inside a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloaterConfig {
    pub count: usize,
    /// Full extent of the spawn box, centred on the origin.
    pub spawn_extent: Vec3,
    /// Half-extent of the reflecting box.
    pub bounds: Vec3,
    /// Full width of each velocity component, at spawn and on direction changes.
    pub initial_speed: f32,
    /// Per-tick probability of picking a new random direction.
    pub direction_change_chance: f32,
    /// Full width of the per-tick velocity jitter.
    pub jitter: f32,
    pub max_speed: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    /// Full width of each per-axis angular velocity.
    pub angular_speed: f32,
    pub size: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub opacity: f32,
}

impl Default for FloaterConfig {
    fn default() -> Self {
        Self {
            count: 8,
            spawn_extent: Vec3::new(30.0, 30.0, 20.0),
            bounds: Vec3::new(25.0, 20.0, 15.0),
            initial_speed: 0.1,
            direction_change_chance: 0.01,
            jitter: 0.002,
            max_speed: 0.2,
            repulsion_radius: 12.0,
            repulsion_strength: 0.2,
            angular_speed: 0.02,
            size: 1.2,
            saturation: 0.7,
            lightness: 0.5,
            opacity: 0.8,
        }
    }
}

/// Proximity graph between particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub base_threshold: f32,
    /// Threshold growth per unit of combined speed.
    pub speed_factor: f32,
    /// Probability that a non-converging pair is connected anyway.
    pub override_chance: f32,
    /// Per-tick probability of a rebuild.
    pub rebuild_chance: f32,
    /// Seconds of suppressed rebuilding after an explosion.
    pub quiet_period: f32,
    pub opacity_speed_weight: f32,
    pub opacity_scale: f32,
    pub color: Vec3,
    /// World-space line width.
    pub line_width: f32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_threshold: 5.0,
            speed_factor: 2.0,
            override_chance: 0.1,
            rebuild_chance: 0.1,
            quiet_period: 2.0,
            opacity_speed_weight: 0.5,
            opacity_scale: 0.15,
            color: hex_to_rgb(0x0a0014),
            line_width: 0.03,
        }
    }
}

/// Pointer hover, repulsion and click explosions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Normalized pointer coordinates are multiplied by this to reach world space.
    pub pointer_scale: f32,
    /// Z of the plane the pointer is projected onto.
    pub pointer_depth: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub hover_scale: f32,
    pub explosion_radius: f32,
    pub explosion_strength: f32,
    /// Constant upward component added to every explosion impulse.
    pub explosion_lift: f32,
    /// Full width of the per-component explosion jitter.
    pub explosion_jitter: f32,
    pub explosion_scale: f32,
    /// Staggered reset delay range in seconds.
    pub reset_delay_min: f32,
    pub reset_delay_max: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pointer_scale: 20.0,
            pointer_depth: 0.0,
            repulsion_radius: 10.0,
            repulsion_strength: 0.08,
            hover_scale: 2.0,
            explosion_radius: 20.0,
            explosion_strength: 0.5,
            explosion_lift: 0.2,
            explosion_jitter: 0.2,
            explosion_scale: 1.5,
            reset_delay_min: 0.5,
            reset_delay_max: 1.0,
        }
    }
}

/// Expanding ring spawned on click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockwaveConfig {
    pub initial_radius: f32,
    /// Radius added per tick.
    pub growth: f32,
    pub initial_opacity: f32,
    /// Opacity removed per tick.
    pub decay: f32,
    /// Inner radius as a fraction of the outer radius.
    pub inner_ratio: f32,
    pub color: Vec3,
}

impl Default for ShockwaveConfig {
    fn default() -> Self {
        Self {
            initial_radius: 0.5,
            growth: 0.2,
            initial_opacity: 0.8,
            decay: 0.02,
            inner_ratio: 0.2,
            color: hex_to_rgb(0x4299e1),
        }
    }
}

/// Camera, fog, lights and clocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_distance: f32,
    pub fog_near: f32,
    pub fog_far: f32,
    /// Simulation seconds per wall-clock second for pulse and hue animation.
    pub time_scale: f32,
    pub ambient: f32,
    pub light_orbit_radius: f32,
    pub light_orbit_speed: f32,
    pub light_smoothing: f32,
    pub light_intensity: f32,
    /// Colours of the orbiting point lights.
    pub lights: Vec<Vec3>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: hex_to_rgb(0x0a0014),
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_distance: 30.0,
            fog_near: 20.0,
            fog_far: 50.0,
            time_scale: 0.5,
            ambient: 0.3,
            light_orbit_radius: 15.0,
            light_orbit_speed: 0.2,
            light_smoothing: 0.05,
            light_intensity: 1.5,
            lights: vec![hex_to_rgb(0x4299e1), hex_to_rgb(0x9f7aea), hex_to_rgb(0xf687b3)],
        }
    }
}

/// Complete configuration for a mounted field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Seed for the shared random source; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub particles: ParticleConfig,
    pub floaters: FloaterConfig,
    pub connections: ConnectionConfig,
    pub interaction: InteractionConfig,
    pub shockwave: ShockwaveConfig,
    pub scene: SceneConfig,
}

impl FieldConfig {
    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, v: f32) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, v)))
            }
        }
        fn probability(name: &str, v: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be in [0, 1], got {}", name, v)))
            }
        }

        let p = &self.particles;
        if p.count > 0 && p.theme.is_empty() {
            return Err(ConfigError::Invalid("particles.theme must not be empty".into()));
        }
        positive("particles.size", p.size)?;
        positive("particles.max_speed", p.max_speed)?;
        probability("particles.damping", p.damping)?;
        probability("particles.smoothing", p.smoothing)?;

        let f = &self.floaters;
        positive("floaters.max_speed", f.max_speed)?;
        if !(f.bounds.is_finite() && f.bounds.min_element() > 0.0) {
            return Err(ConfigError::Invalid("floaters.bounds must be positive".into()));
        }
        probability("floaters.direction_change_chance", f.direction_change_chance)?;

        let c = &self.connections;
        positive("connections.base_threshold", c.base_threshold)?;
        probability("connections.override_chance", c.override_chance)?;
        probability("connections.rebuild_chance", c.rebuild_chance)?;
        if c.quiet_period < 0.0 {
            return Err(ConfigError::Invalid("connections.quiet_period must not be negative".into()));
        }

        let i = &self.interaction;
        positive("interaction.explosion_radius", i.explosion_radius)?;
        if i.reset_delay_min < 0.0 || i.reset_delay_max < i.reset_delay_min {
            return Err(ConfigError::Invalid(
                "interaction reset delay range must satisfy 0 <= min <= max".into(),
            ));
        }

        let s = &self.shockwave;
        positive("shockwave.decay", s.decay)?;

        let sc = &self.scene;
        positive("scene.fov_degrees", sc.fov_degrees)?;
        positive("scene.near", sc.near)?;
        if sc.far <= sc.near {
            return Err(ConfigError::Invalid("scene.far must exceed scene.near".into()));
        }

        Ok(())
    }
}
