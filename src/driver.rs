//! Frame driver: one simulation step and one render per display frame.

use crate::error::RenderError;
use crate::scene::{RenderBackend, SceneSurface};
use crate::simulation::{SimulationContext, TickReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
}

/// Decides when a tick happens. Holds no simulation state of its own.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    state: DriverState,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Stopped,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Begin ticking. Allocates scene resources if the scene is detached.
    pub fn start(&mut self, ctx: &SimulationContext, scene: &mut SceneSurface) {
        if self.state == DriverState::Running {
            return;
        }
        if !scene.is_attached() {
            scene.attach(ctx);
        }
        self.state = DriverState::Running;
    }

    /// Stop ticking, cancel pending timed effects and release every graphics resource.
    ///
    /// Safe to call at any point, any number of times.
    pub fn stop<B: RenderBackend>(&mut self, ctx: &mut SimulationContext, scene: &mut SceneSurface, backend: &mut B) {
        if self.state == DriverState::Stopped {
            return;
        }
        ctx.cancel_pending();
        scene.dispose();
        backend.release();
        self.state = DriverState::Stopped;
    }

    /// Run one tick: floaters, particles, connections, effects, then render.
    ///
    /// Returns `Ok(None)` while stopped. A lost surface is reconfigured and
    /// other transient render failures skip the frame; only running out of
    /// memory is returned as an error.
    pub fn tick<B: RenderBackend>(
        &mut self,
        ctx: &mut SimulationContext,
        scene: &mut SceneSurface,
        backend: &mut B,
        dt: f32,
    ) -> Result<Option<TickReport>, RenderError> {
        if self.state != DriverState::Running {
            return Ok(None);
        }

        let report = ctx.step(dt);
        let frame = scene.frame(ctx);

        match backend.render(&frame) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => {
                let (width, height) = scene.viewport();
                log::warn!("render surface lost, reconfiguring at {}x{}", width, height);
                backend.resize(width, height);
            }
            Err(RenderError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => log::error!("{}", e),
        }

        Ok(Some(report))
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::scene::{FrameGeometry, HeadlessBackend};

    fn setup() -> (SimulationContext, SceneSurface, HeadlessBackend) {
        let mut config = FieldConfig::default();
        config.seed = Some(4);
        let ctx = SimulationContext::new(config).unwrap();
        let scene = SceneSurface::new(640, 480, &ctx.config.scene);
        (ctx, scene, HeadlessBackend::default())
    }

    #[test]
    fn test_stopped_driver_does_nothing() {
        let (mut ctx, mut scene, mut backend) = setup();
        let mut driver = FrameDriver::new();
        assert_eq!(driver.tick(&mut ctx, &mut scene, &mut backend, 0.016), Ok(None));
        assert_eq!(ctx.ticks(), 0);
        assert_eq!(backend.frames, 0);
    }

    #[test]
    fn test_tick_steps_and_renders() {
        let (mut ctx, mut scene, mut backend) = setup();
        let mut driver = FrameDriver::new();
        driver.start(&ctx, &mut scene);
        for _ in 0..10 {
            assert!(driver.tick(&mut ctx, &mut scene, &mut backend, 0.016).unwrap().is_some());
        }
        assert_eq!(ctx.ticks(), 10);
        assert_eq!(backend.frames, 10);
        assert_eq!(backend.last_counts.0, ctx.particles.len());
    }

    #[test]
    fn test_stop_cancels_and_releases() {
        let (mut ctx, mut scene, mut backend) = setup();
        let mut driver = FrameDriver::new();
        driver.start(&ctx, &mut scene);
        driver.tick(&mut ctx, &mut scene, &mut backend, 0.016).unwrap();

        ctx.effects.schedule_scale_reset(0, 0.5);
        ctx.connections.begin_quiet_period(2.0);
        driver.stop(&mut ctx, &mut scene, &mut backend);
        driver.stop(&mut ctx, &mut scene, &mut backend);

        assert!(!driver.is_running());
        assert!(ctx.effects.is_idle());
        assert!(!ctx.connections.is_quiet());
        assert_eq!(scene.resources().live_count(), 0);
        assert_eq!(backend.releases, 1);

        driver.start(&ctx, &mut scene);
        driver.tick(&mut ctx, &mut scene, &mut backend, 0.016).unwrap();
        assert!(scene.resources().live_count() >= ctx.particles.len() + ctx.floaters.len());
    }

    struct FlakyBackend {
        errors: Vec<RenderError>,
        resized: u32,
    }

    impl RenderBackend for FlakyBackend {
        fn resize(&mut self, _width: u32, _height: u32) {
            self.resized += 1;
        }

        fn render(&mut self, _frame: &FrameGeometry) -> Result<(), RenderError> {
            match self.errors.pop() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn release(&mut self) {}
    }

    #[test]
    fn test_render_error_handling() {
        let (mut ctx, mut scene, _) = setup();
        let mut backend = FlakyBackend {
            errors: vec![
                RenderError::OutOfMemory,
                RenderError::Other("timeout".into()),
                RenderError::SurfaceLost,
            ],
            resized: 0,
        };
        let mut driver = FrameDriver::new();
        driver.start(&ctx, &mut scene);

        assert!(driver.tick(&mut ctx, &mut scene, &mut backend, 0.016).is_ok());
        assert_eq!(backend.resized, 1);
        assert!(driver.tick(&mut ctx, &mut scene, &mut backend, 0.016).is_ok());
        assert_eq!(
            driver.tick(&mut ctx, &mut scene, &mut backend, 0.016),
            Err(RenderError::OutOfMemory)
        );
    }
}
