//! Pointer hover, click explosions and resize.
//!
//! The controller is the only writer of target fields on particles
//! (`target_scale` and injected velocity) outside of scheduled resets.

use glam::Vec3;

use crate::camera::Camera;
use crate::input::{normalize_pointer, HostEvent};
use crate::math::VecExt;
use crate::simulation::SimulationContext;

/// Outcome of a click.
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    /// World-space click point.
    pub center: Vec3,
    /// Particles whose velocity was replaced.
    pub affected: Vec<usize>,
    pub shockwave: u64,
}

/// Maps host input onto the simulation context.
#[derive(Debug, Clone)]
pub struct InteractionController {
    width: u32,
    height: u32,
}

impl InteractionController {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Dispatch one host event.
    pub fn handle(&mut self, event: HostEvent, ctx: &mut SimulationContext, camera: &mut Camera) {
        match event {
            HostEvent::PointerMoved { x, y } => {
                self.on_pointer_move(ctx, camera, x, y);
            }
            HostEvent::Click { x, y } => {
                self.on_click(ctx, x, y);
            }
            HostEvent::Resized { width, height } => self.on_resize(camera, width, height),
        }
    }

    /// Update the pointer and the hovered particle.
    ///
    /// Every target scale resets to 1, then the particle nearest along the
    /// picking ray (if any) is enlarged. Returns the hovered index.
    pub fn on_pointer_move(&mut self, ctx: &mut SimulationContext, camera: &Camera, x: f32, y: f32) -> Option<usize> {
        ctx.pointer.set_normalized(normalize_pointer(x, y, self.width, self.height));

        let ray = camera.ray_from_ndc(ctx.pointer.normalized());
        let size = ctx.config.particles.size;
        let hovered = ctx
            .particles
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                ray.intersect_sphere(p.position, size * p.current_scale.max(0.0))
                    .map(|t| (i, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        ctx.particles.reset_target_scales();
        if let Some(index) = hovered {
            ctx.particles.set_target_scale(index, ctx.config.interaction.hover_scale);
        }
        ctx.pointer.hovered = hovered;
        hovered
    }

    /// Explode particles away from the click point.
    ///
    /// Velocities inside the explosion radius are replaced, not added to.
    /// Each affected particle draws its jitter and then its reset delay from
    /// the shared random source, in index order. The edge set is cleared and
    /// rebuilding paused for the quiet period; a shockwave always spawns,
    /// even when nothing was in range.
    pub fn on_click(&mut self, ctx: &mut SimulationContext, x: f32, y: f32) -> Explosion {
        ctx.pointer.set_normalized(normalize_pointer(x, y, self.width, self.height));
        let center = ctx.pointer.world_point(&ctx.config.interaction);
        let cfg = ctx.config.interaction.clone();

        let mut affected = Vec::new();
        for (index, particle) in ctx.particles.iter_mut().enumerate() {
            let distance = particle.position.distance(center);
            if !(distance < cfg.explosion_radius) {
                continue;
            }

            let falloff = cfg.explosion_strength * (1.0 - distance / cfg.explosion_radius);
            let mut force = center.direction_to(particle.position) * falloff;
            force.y += cfg.explosion_lift;
            force += ctx.rng.signed_vec3(cfg.explosion_jitter);

            particle.velocity = force.finite_or(Vec3::ZERO);
            particle.target_scale = cfg.explosion_scale;

            let delay = ctx.rng.range(cfg.reset_delay_min, cfg.reset_delay_max);
            ctx.effects.schedule_scale_reset(index, delay);
            affected.push(index);
        }

        ctx.connections.begin_quiet_period(ctx.config.connections.quiet_period);
        let shockwave = ctx.effects.spawn_shockwave(center, &ctx.config.shockwave);

        log::debug!("explosion at {:?} affected {} particles", center, affected.len());
        Explosion {
            center,
            affected,
            shockwave,
        }
    }

    /// Track the new viewport and update the camera projection.
    ///
    /// Holds no other state, so repeating it with the same size changes nothing.
    pub fn on_resize(&mut self, camera: &mut Camera, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        camera.set_viewport(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;

    fn setup(particles: usize) -> (InteractionController, SimulationContext, Camera) {
        let mut config = FieldConfig::default();
        config.seed = Some(12);
        config.particles.count = particles;
        config.floaters.count = 0;
        let ctx = SimulationContext::new(config).unwrap();
        let mut camera = Camera::new(&ctx.config.scene);
        let mut controller = InteractionController::new(800, 600);
        controller.on_resize(&mut camera, 800, 600);
        (controller, ctx, camera)
    }

    #[test]
    fn test_hover_is_exclusive() {
        let (mut controller, mut ctx, camera) = setup(3);
        ctx.particles.get_mut(0).unwrap().position = Vec3::ZERO;
        ctx.particles.get_mut(1).unwrap().position = Vec3::new(0.0, 0.0, 5.0);
        ctx.particles.get_mut(2).unwrap().position = Vec3::new(15.0, 0.0, 0.0);
        ctx.particles.set_target_scale(2, 1.5);

        // Screen centre: both 0 and 1 lie on the ray; 1 is nearer the camera
        let hovered = controller.on_pointer_move(&mut ctx, &camera, 400.0, 300.0);
        assert_eq!(hovered, Some(1));
        let scales: Vec<f32> = ctx.particles.iter().map(|p| p.target_scale).collect();
        assert_eq!(scales, vec![1.0, 2.0, 1.0]);

        // Moving to an empty corner clears the hover
        let hovered = controller.on_pointer_move(&mut ctx, &camera, 0.0, 0.0);
        assert_eq!(hovered, None);
        assert!(ctx.particles.iter().all(|p| p.target_scale == 1.0));
        assert_eq!(ctx.pointer.hovered, None);
    }

    #[test]
    fn test_click_outside_viewport_is_clamped() {
        let (mut controller, mut ctx, _) = setup(0);
        let explosion = controller.on_click(&mut ctx, -1e6, 1e6);
        assert_eq!(explosion.center, Vec3::new(-20.0, -20.0, 0.0));
    }

    #[test]
    fn test_click_replaces_velocity() {
        let (mut controller, mut ctx, _) = setup(1);
        {
            let p = ctx.particles.get_mut(0).unwrap();
            p.position = Vec3::new(0.0, 5.0, 0.0);
            p.velocity = Vec3::new(100.0, 100.0, 100.0);
        }
        let mut replay = ctx.rng.clone();

        let explosion = controller.on_click(&mut ctx, 400.0, 300.0);
        assert_eq!(explosion.affected, vec![0]);

        let jitter = replay.signed_vec3(0.2);
        let expected = Vec3::new(0.0, 0.5 * 0.75 + 0.2, 0.0) + jitter;
        let p = ctx.particles.get(0).unwrap();
        assert!((p.velocity - expected).length() < 1e-5);
        assert_eq!(p.target_scale, 1.5);

        let delay = replay.range(0.5, 1.0);
        assert_eq!(ctx.effects.pending_reset(0), Some(delay));
    }

    #[test]
    fn test_resize_idempotent() {
        let (mut controller, _, mut camera) = setup(0);
        controller.on_resize(&mut camera, 1024, 512);
        let once = camera.clone();
        controller.on_resize(&mut camera, 1024, 512);
        assert_eq!(camera, once);
        assert_eq!(controller.viewport(), (1024, 512));

        controller.on_resize(&mut camera, 0, 0);
        assert_eq!(controller.viewport(), (1024, 512));
    }
}
