//! # Particle Field
//!
//! An interactive 3D particle field: a swarm of small lit bodies drifting
//! around a spherical shell, a handful of wireframe "floaters" wandering
//! through a box, and a live proximity graph drawn between nearby bodies.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_field::prelude::*;
//!
//! fn main() -> Result<(), MountError> {
//!     FieldBuilder::new()
//!         .with_particle_count(150)
//!         .with_floater_count(8)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Simulation
//!
//! All state lives in one [`SimulationContext`]: the particle and floater
//! stores, the connection graph, pending timed effects, the pointer and the
//! shared random source. Each tick runs in a fixed order:
//!
//! 1. floaters move, bounce and shy away from the pointer
//! 2. particles follow floaters, flee the pointer and drift home
//! 3. the connection graph is maybe rebuilt
//! 4. shockwaves grow and fade; scheduled scale resets fire
//!
//! Forces are applied per tick. The frame delta only drives clocks
//! (pulse, hue cycling, quiet periods, delays).
//!
//! ### Interaction
//!
//! Moving the pointer grows the hovered particle and pushes nearby ones
//! away. Clicking sets off an explosion: particles near the click point are
//! flung outward, a shockwave ring expands, and the connection graph goes
//! quiet for a moment.
//!
//! ### Rendering
//!
//! The scene is rendered through the [`RenderBackend`] trait. [`GpuState`]
//! draws with wgpu; [`HeadlessBackend`] only counts frames, which is what
//! the tests use.
//!
//! ## Headless Use
//!
//! ```
//! use particle_field::prelude::*;
//!
//! let config = FieldBuilder::new().with_seed(1).with_particle_count(20).config().clone();
//! let mut field = ParticleField::mount(config, 640, 480, HeadlessBackend::default()).unwrap();
//! field.handle_event(HostEvent::Click { x: 320.0, y: 240.0 });
//! for _ in 0..60 {
//!     field.frame(1.0 / 60.0).unwrap();
//! }
//! field.dispose();
//! assert_eq!(field.scene().resources().live_count(), 0);
//! ```
//!
//! [`GpuState`]: gpu::GpuState

pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod connections;
pub mod driver;
pub mod effects;
pub mod error;
pub mod field;
pub mod floater;
pub mod gpu;
pub mod input;
pub mod interaction;
pub mod math;
pub mod particle;
pub mod rng;
pub mod scene;
pub mod simulation;
pub mod time;

pub use camera::Camera;
pub use config::FieldConfig;
pub use error::{ConfigError, GpuError, MountError, RenderError};
pub use field::{FieldBuilder, ParticleField};
pub use glam::{Vec2, Vec3};
pub use input::HostEvent;
pub use rng::SimRng;
pub use scene::{HeadlessBackend, RenderBackend, SceneSurface};
pub use simulation::{SimulationContext, TickReport};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use particle_field::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        ConnectionConfig, FieldConfig, FloaterConfig, InteractionConfig, ParticleConfig, SceneConfig,
        ShockwaveConfig,
    };
    pub use crate::error::{ConfigError, MountError, RenderError};
    pub use crate::field::{FieldBuilder, ParticleField};
    pub use crate::input::HostEvent;
    pub use crate::scene::{FrameGeometry, HeadlessBackend, RenderBackend};
    pub use crate::simulation::{SimulationContext, TickReport};
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3};
}
