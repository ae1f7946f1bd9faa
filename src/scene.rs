//! Render-side layer: scene resources, per-frame geometry and the backend seam.
//!
//! Simulation entities never hold graphics objects. The [`SceneSurface`]
//! keeps a [`ResourceTable`] mapping stable [`Handle`]s to the entity each
//! render object stands for; every frame the geometry is assembled by
//! walking those handles and looking the entity up in the
//! [`SimulationContext`]. Disposing the surface releases every handle.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::color::srgb_to_linear;
use crate::config::SceneConfig;
use crate::error::RenderError;
use crate::simulation::SimulationContext;

/// Stable identifier for one render resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// The simulation entity a render resource draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneObject {
    Particle(usize),
    Floater(usize),
    Edge(usize),
    Shockwave(u64),
}

/// Live render resources indexed by handle.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    objects: BTreeMap<Handle, SceneObject>,
    next: u32,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, object: SceneObject) -> Handle {
        let handle = Handle(self.next);
        self.next = self.next.wrapping_add(1);
        self.objects.insert(handle, object);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<SceneObject> {
        self.objects.get(&handle).copied()
    }

    /// Release one resource. Releasing an unknown handle is a no-op.
    pub fn release(&mut self, handle: Handle) -> Option<SceneObject> {
        self.objects.remove(&handle)
    }

    /// Release everything and return how many resources were live.
    pub fn release_all(&mut self) -> usize {
        let count = self.objects.len();
        self.objects.clear();
        count
    }

    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Live resources of one kind.
    pub fn count(&self, kind: fn(&SceneObject) -> bool) -> usize {
        self.objects.values().filter(|o| kind(o)).count()
    }
}

/// Per-frame uniform block shared by every pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera position, w = scaled time.
    pub camera: [f32; 4],
    /// rgb = fog and clear colour (linear), w = unused.
    pub fog_color: [f32; 4],
    /// x = fog near, y = fog far, z = line width, w = ring inner ratio.
    pub params: [f32; 4],
    /// rgb = ambient colour (linear), w = ambient intensity.
    pub ambient: [f32; 4],
    /// xyz = position, w = intensity.
    pub light_positions: [[f32; 4]; 3],
    pub light_colors: [[f32; 4]; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub radius: f32,
    /// Linear rgb plus opacity.
    pub color: [f32; 4],
    /// Linear emissive rgb, w = billboard rotation.
    pub emissive: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FloaterInstance {
    pub position: [f32; 3],
    pub size: f32,
    /// Euler angles, w unused.
    pub rotation: [f32; 4],
    /// Linear rgb plus opacity.
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EdgeInstance {
    pub start: [f32; 3],
    pub opacity: f32,
    pub end: [f32; 3],
    pub _pad: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RingInstance {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone)]
pub struct FrameGeometry {
    pub uniforms: FrameUniforms,
    pub particles: Vec<ParticleInstance>,
    pub floaters: Vec<FloaterInstance>,
    pub edges: Vec<EdgeInstance>,
    pub rings: Vec<RingInstance>,
}

/// Where frames go. Implemented by the GPU renderer and by [`HeadlessBackend`].
pub trait RenderBackend {
    /// Resize the render target. Zero dimensions are ignored.
    fn resize(&mut self, width: u32, height: u32);

    fn render(&mut self, frame: &FrameGeometry) -> Result<(), RenderError>;

    /// Release every per-scene graphics resource. The next render
    /// reallocates. Must be safe to call more than once.
    fn release(&mut self);
}

/// Backend that records frames without drawing them.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    pub size: (u32, u32),
    pub frames: u64,
    /// Whether instance buffers are currently held.
    pub allocated: bool,
    /// Times a held set of buffers was released.
    pub releases: u32,
    /// Instance counts of the last frame: particles, floaters, edges, rings.
    pub last_counts: (usize, usize, usize, usize),
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
    }

    fn render(&mut self, frame: &FrameGeometry) -> Result<(), RenderError> {
        self.allocated = true;
        self.frames += 1;
        self.last_counts = (
            frame.particles.len(),
            frame.floaters.len(),
            frame.edges.len(),
            frame.rings.len(),
        );
        Ok(())
    }

    fn release(&mut self) {
        if self.allocated {
            self.releases += 1;
        }
        self.allocated = false;
    }
}

/// Three coloured point lights drifting around the Y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub positions: [Vec3; 3],
}

impl LightRig {
    pub fn new() -> Self {
        Self {
            positions: [
                Vec3::new(10.0, 10.0, 10.0),
                Vec3::new(-10.0, -10.0, -10.0),
                Vec3::new(0.0, 10.0, -10.0),
            ],
        }
    }

    /// Ease each light's XZ position toward its spot on the orbit at `time`.
    pub fn update(&mut self, time: f32, config: &SceneConfig) {
        for (i, position) in self.positions.iter_mut().enumerate() {
            let angle = time * config.light_orbit_speed + i as f32 * TAU / 3.0;
            let target_x = angle.cos() * config.light_orbit_radius;
            let target_z = angle.sin() * config.light_orbit_radius;
            position.x += (target_x - position.x) * config.light_smoothing;
            position.z += (target_z - position.z) * config.light_smoothing;
        }
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the viewport, the camera and every render resource handle.
#[derive(Debug, Clone)]
pub struct SceneSurface {
    width: u32,
    height: u32,
    camera: Camera,
    lights: LightRig,
    resources: ResourceTable,
    particles: Vec<Handle>,
    floaters: Vec<Handle>,
    edges: Vec<Handle>,
    /// Edge-set generation the edge handles were built from.
    edge_generation: Option<u64>,
    shockwaves: BTreeMap<u64, Handle>,
    attached: bool,
}

impl SceneSurface {
    pub fn new(width: u32, height: u32, config: &SceneConfig) -> Self {
        let mut camera = Camera::new(config);
        camera.set_viewport(width, height);
        Self {
            width,
            height,
            camera,
            lights: LightRig::new(),
            resources: ResourceTable::new(),
            particles: Vec::new(),
            floaters: Vec::new(),
            edges: Vec::new(),
            edge_generation: None,
            shockwaves: BTreeMap::new(),
            attached: false,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Allocate one resource per particle and floater.
    ///
    /// Attaching again after [`SceneSurface::dispose`] starts from a clean table.
    pub fn attach(&mut self, ctx: &SimulationContext) {
        self.release_all();
        self.attached = true;
        self.particles = (0..ctx.particles.len())
            .map(|i| self.resources.allocate(SceneObject::Particle(i)))
            .collect();
        self.floaters = (0..ctx.floaters.len())
            .map(|i| self.resources.allocate(SceneObject::Floater(i)))
            .collect();
        log::debug!("scene attached with {} resources", self.resources.live_count());
    }

    /// Resize the viewport and the camera projection. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.camera.set_viewport(width, height);
    }

    /// Replace edge resources if the edge set changed since the last sync.
    pub fn sync_edges(&mut self, ctx: &SimulationContext) {
        let generation = ctx.connections.generation();
        if !self.attached || self.edge_generation == Some(generation) {
            return;
        }
        for handle in self.edges.drain(..) {
            self.resources.release(handle);
        }
        self.edges = (0..ctx.connections.edges().len())
            .map(|i| self.resources.allocate(SceneObject::Edge(i)))
            .collect();
        self.edge_generation = Some(generation);
    }

    /// Allocate resources for new shockwaves and release retired ones.
    pub fn sync_shockwaves(&mut self, ctx: &SimulationContext) {
        if !self.attached {
            return;
        }
        let active = ctx.effects.shockwaves();
        let resources = &mut self.resources;
        self.shockwaves.retain(|id, handle| {
            let alive = active.iter().any(|w| w.id == *id);
            if !alive {
                resources.release(*handle);
            }
            alive
        });
        for wave in active {
            if !self.shockwaves.contains_key(&wave.id) {
                let handle = self.resources.allocate(SceneObject::Shockwave(wave.id));
                self.shockwaves.insert(wave.id, handle);
            }
        }
    }

    /// Sync resources with the simulation and assemble this frame's geometry.
    pub fn frame(&mut self, ctx: &SimulationContext) -> FrameGeometry {
        self.sync_edges(ctx);
        self.sync_shockwaves(ctx);

        let config = &ctx.config;
        self.lights.update(ctx.elapsed(), &config.scene);

        let mut geometry = FrameGeometry {
            uniforms: self.uniforms(ctx),
            particles: Vec::with_capacity(self.particles.len()),
            floaters: Vec::with_capacity(self.floaters.len()),
            edges: Vec::with_capacity(self.edges.len()),
            rings: Vec::with_capacity(self.shockwaves.len()),
        };

        let handles = self
            .particles
            .iter()
            .chain(&self.floaters)
            .chain(&self.edges)
            .chain(self.shockwaves.values());

        for &handle in handles {
            match self.resources.get(handle) {
                Some(SceneObject::Particle(i)) => {
                    if let Some(p) = ctx.particles.get(i) {
                        geometry.particles.push(ParticleInstance {
                            position: p.position.to_array(),
                            radius: config.particles.size * p.current_scale,
                            color: srgb_to_linear(p.color).extend(config.particles.opacity).to_array(),
                            emissive: srgb_to_linear(p.emissive).extend(p.rotation).to_array(),
                        });
                    }
                }
                Some(SceneObject::Floater(i)) => {
                    if let Some(f) = ctx.floaters.as_slice().get(i) {
                        geometry.floaters.push(FloaterInstance {
                            position: f.position.to_array(),
                            size: config.floaters.size,
                            rotation: f.rotation.extend(0.0).to_array(),
                            color: srgb_to_linear(f.base_color).extend(config.floaters.opacity).to_array(),
                        });
                    }
                }
                Some(SceneObject::Edge(i)) => {
                    let edge = ctx.connections.edges().get(i);
                    let ends = edge.and_then(|e| Some((e, ctx.particles.get(e.a)?, ctx.particles.get(e.b)?)));
                    if let Some((e, a, b)) = ends {
                        geometry.edges.push(EdgeInstance {
                            start: a.position.to_array(),
                            opacity: e.opacity,
                            end: b.position.to_array(),
                            _pad: 0.0,
                            color: srgb_to_linear(config.connections.color).extend(1.0).to_array(),
                        });
                    }
                }
                Some(SceneObject::Shockwave(id)) => {
                    if let Some(w) = ctx.effects.shockwaves().iter().find(|w| w.id == id) {
                        geometry.rings.push(RingInstance {
                            center: w.center.to_array(),
                            radius: w.radius,
                            color: srgb_to_linear(config.shockwave.color).to_array(),
                            opacity: w.opacity,
                        });
                    }
                }
                None => {}
            }
        }

        geometry
    }

    fn uniforms(&self, ctx: &SimulationContext) -> FrameUniforms {
        let scene = &ctx.config.scene;
        let fog = srgb_to_linear(scene.background);
        let ambient = srgb_to_linear(scene.lights.first().copied().unwrap_or(Vec3::ONE));

        let mut light_positions = [[0.0; 4]; 3];
        let mut light_colors = [[0.0; 4]; 3];
        for (i, position) in self.lights.positions.iter().enumerate() {
            light_positions[i] = position.extend(scene.light_intensity).to_array();
            if let Some(color) = scene.lights.get(i) {
                light_colors[i] = srgb_to_linear(*color).extend(1.0).to_array();
            }
        }

        let view_proj: Mat4 = self.camera.view_proj();
        FrameUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            camera: self.camera.position().extend(ctx.elapsed()).to_array(),
            fog_color: fog.extend(1.0).to_array(),
            params: [
                scene.fog_near,
                scene.fog_far,
                ctx.config.connections.line_width,
                ctx.config.shockwave.inner_ratio,
            ],
            ambient: ambient.extend(scene.ambient).to_array(),
            light_positions,
            light_colors,
        }
    }

    fn release_all(&mut self) -> usize {
        self.particles.clear();
        self.floaters.clear();
        self.edges.clear();
        self.shockwaves.clear();
        self.edge_generation = None;
        self.resources.release_all()
    }

    /// Release every render resource. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if !self.attached {
            return;
        }
        let released = self.release_all();
        self.attached = false;
        log::debug!("scene disposed, released {} resources", released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use glam::Vec2;

    fn context() -> SimulationContext {
        let mut config = FieldConfig::default();
        config.seed = Some(21);
        config.connections.rebuild_chance = 1.0;
        SimulationContext::new(config).unwrap()
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 224);
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 48);
        assert_eq!(std::mem::size_of::<FloaterInstance>(), 48);
        assert_eq!(std::mem::size_of::<EdgeInstance>(), 48);
        assert_eq!(std::mem::size_of::<RingInstance>(), 32);
    }

    #[test]
    fn test_resource_table() {
        let mut table = ResourceTable::new();
        let a = table.allocate(SceneObject::Particle(0));
        let b = table.allocate(SceneObject::Edge(0));
        assert_ne!(a, b);
        assert_eq!(table.get(b), Some(SceneObject::Edge(0)));
        assert_eq!(table.count(|o| matches!(o, SceneObject::Particle(_))), 1);

        assert_eq!(table.release(a), Some(SceneObject::Particle(0)));
        assert_eq!(table.release(a), None);
        assert_eq!(table.release_all(), 1);
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn test_frame_joins_by_handle() {
        let mut ctx = context();
        let mut scene = SceneSurface::new(800, 600, &ctx.config.scene);
        scene.attach(&ctx);
        ctx.step(1.0 / 60.0);
        ctx.effects.spawn_shockwave(Vec3::ZERO, &ctx.config.shockwave);

        let frame = scene.frame(&ctx);
        assert_eq!(frame.particles.len(), ctx.particles.len());
        assert_eq!(frame.floaters.len(), ctx.floaters.len());
        assert_eq!(frame.edges.len(), ctx.connections.edges().len());
        assert_eq!(frame.rings.len(), 1);
        assert_eq!(
            scene.resources().live_count(),
            ctx.particles.len() + ctx.floaters.len() + ctx.connections.edges().len() + 1
        );

        let p = ctx.particles.get(0).unwrap();
        assert_eq!(frame.particles[0].position, p.position.to_array());
    }

    #[test]
    fn test_retired_shockwave_releases_resource() {
        let mut ctx = context();
        let mut scene = SceneSurface::new(800, 600, &ctx.config.scene);
        scene.attach(&ctx);
        ctx.effects.spawn_shockwave(Vec3::ZERO, &ctx.config.shockwave);
        scene.sync_shockwaves(&ctx);
        assert_eq!(scene.resources().count(|o| matches!(o, SceneObject::Shockwave(_))), 1);

        for _ in 0..40 {
            ctx.step(1.0 / 60.0);
        }
        scene.sync_shockwaves(&ctx);
        assert_eq!(scene.resources().count(|o| matches!(o, SceneObject::Shockwave(_))), 0);
    }

    #[test]
    fn test_resize_idempotent() {
        let ctx = context();
        let mut scene = SceneSurface::new(800, 600, &ctx.config.scene);
        scene.resize(1920, 1080);
        let once = scene.camera().clone();
        scene.resize(1920, 1080);
        assert_eq!(scene.camera(), &once);
        scene.resize(0, 0);
        assert_eq!(scene.viewport(), (1920, 1080));
    }

    #[test]
    fn test_dispose_is_idempotent_and_reattachable() {
        let ctx = context();
        let mut scene = SceneSurface::new(800, 600, &ctx.config.scene);
        scene.attach(&ctx);
        assert!(scene.is_attached());
        scene.dispose();
        scene.dispose();
        assert_eq!(scene.resources().live_count(), 0);
        assert!(!scene.is_attached());

        scene.attach(&ctx);
        assert!(scene.is_attached());
        assert_eq!(scene.resources().live_count(), ctx.particles.len() + ctx.floaters.len());
    }

    #[test]
    fn test_lights_drift_toward_orbit() {
        let config = SceneConfig::default();
        let mut rig = LightRig::new();
        for _ in 0..500 {
            rig.update(0.0, &config);
        }
        let p = rig.positions[0];
        assert!((Vec2::new(p.x, p.z).length() - config.light_orbit_radius).abs() < 1e-2);
        // Height is never touched
        assert_eq!(p.y, 10.0);
    }
}
