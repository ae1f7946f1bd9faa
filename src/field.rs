//! The mounted field: the handle a host gets back from [`ParticleField::mount`].
//!
//! Mounting builds the simulation, attaches the scene and starts the frame
//! driver. The returned value is the disposer: [`ParticleField::dispose`]
//! (or dropping it) stops the driver, cancels every pending timed effect
//! and releases all graphics resources.

use crate::config::FieldConfig;
use crate::driver::FrameDriver;
use crate::error::{MountError, RenderError};
use crate::input::HostEvent;
use crate::interaction::InteractionController;
use crate::scene::{RenderBackend, SceneSurface};
use crate::simulation::{SimulationContext, TickReport};

/// A running particle field drawing into `B`.
pub struct ParticleField<B: RenderBackend> {
    ctx: SimulationContext,
    scene: SceneSurface,
    controller: InteractionController,
    driver: FrameDriver,
    backend: B,
    disposed: bool,
}

impl<B: RenderBackend> ParticleField<B> {
    /// Build and start a field on a `width` x `height` pixel surface.
    pub fn mount(config: FieldConfig, width: u32, height: u32, mut backend: B) -> Result<Self, MountError> {
        let ctx = SimulationContext::new(config)?;
        let mut scene = SceneSurface::new(width, height, &ctx.config.scene);
        backend.resize(width, height);

        let mut driver = FrameDriver::new();
        driver.start(&ctx, &mut scene);

        log::info!(
            "mounted particle field: {} particles, {} floaters, {}x{}",
            ctx.particles.len(),
            ctx.floaters.len(),
            width,
            height
        );

        Ok(Self {
            ctx,
            scene,
            controller: InteractionController::new(width, height),
            driver,
            backend,
            disposed: false,
        })
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    pub fn scene(&self) -> &SceneSurface {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Feed one host event. Ignored after disposal.
    pub fn handle_event(&mut self, event: HostEvent) {
        if self.disposed {
            return;
        }
        match event {
            HostEvent::Resized { width, height } => {
                self.controller.on_resize(self.scene.camera_mut(), width, height);
                self.scene.resize(width, height);
                self.backend.resize(width, height);
            }
            HostEvent::PointerMoved { x, y } => {
                self.controller.on_pointer_move(&mut self.ctx, self.scene.camera(), x, y);
            }
            HostEvent::Click { x, y } => {
                self.controller.on_click(&mut self.ctx, x, y);
            }
        }
    }

    /// Advance and draw one frame of `dt` seconds.
    pub fn frame(&mut self, dt: f32) -> Result<Option<TickReport>, RenderError> {
        self.driver.tick(&mut self.ctx, &mut self.scene, &mut self.backend, dt)
    }

    /// Resume after [`ParticleField::stop`]. Has no effect once disposed.
    pub fn start(&mut self) {
        if !self.disposed {
            self.driver.start(&self.ctx, &mut self.scene);
        }
    }

    /// Pause the field and release its graphics resources.
    pub fn stop(&mut self) {
        self.driver.stop(&mut self.ctx, &mut self.scene, &mut self.backend);
    }

    /// Stop the field for good. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.driver.stop(&mut self.ctx, &mut self.scene, &mut self.backend);
        self.ctx.cancel_pending();
        self.scene.dispose();
        self.backend.release();
        self.disposed = true;
        log::info!("particle field disposed");
    }
}

impl<B: RenderBackend> Drop for ParticleField<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builder for a windowed field.
///
/// # Example
///
/// ```ignore
/// use particle_field::FieldBuilder;
///
/// FieldBuilder::new()
///     .with_particle_count(300)
///     .with_seed(7)
///     .run()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldBuilder {
    config: FieldConfig,
}

impl FieldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.config.particles.count = count;
        self
    }

    pub fn with_floater_count(mut self, count: usize) -> Self {
        self.config.floaters.count = count;
        self
    }

    /// Seed the random source for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Open a window and run until it is closed.
    pub fn run(self) -> Result<(), MountError> {
        crate::app::run(self.config)
    }
}
