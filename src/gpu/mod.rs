//! wgpu renderer for [`FrameGeometry`].
//!
//! Every pass draws instanced geometry generated in the vertex shader from
//! `vertex_index`, so no mesh buffers exist: only one uniform buffer and one
//! growable instance buffer per pass. Releasing the renderer drops the
//! instance buffers; the next frame reallocates them.

mod connections;
mod particles;
mod shockwave;
mod wireframe;

use std::marker::PhantomData;
use std::sync::Arc;

use bytemuck::Pod;
use winit::window::Window;

use crate::error::{GpuError, RenderError};
use crate::scene::{FrameGeometry, FrameUniforms, RenderBackend};

pub use connections::EDGE_SHADER;
pub use particles::PARTICLE_SHADER;
pub use shockwave::RING_SHADER;
pub use wireframe::WIREFRAME_SHADER;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Smallest instance buffer allocated, in instances.
const MIN_INSTANCES: usize = 16;

/// Uniform block and helpers shared by every shader.
pub const FRAME_WGSL: &str = r#"struct Uniforms {
    view_proj: mat4x4<f32>,
    camera: vec4<f32>,
    fog_color: vec4<f32>,
    params: vec4<f32>,
    ambient: vec4<f32>,
    light_positions: array<vec4<f32>, 3>,
    light_colors: array<vec4<f32>, 3>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

fn apply_fog(color: vec3<f32>, world_pos: vec3<f32>) -> vec3<f32> {
    let dist = distance(world_pos, uniforms.camera.xyz);
    let amount = smoothstep(uniforms.params.x, uniforms.params.y, dist);
    return mix(color, uniforms.fog_color.rgb, amount);
}

// Columns: right, up, toward the camera
fn billboard_basis(center: vec3<f32>) -> mat3x3<f32> {
    let forward = normalize(uniforms.camera.xyz - center);
    var right = cross(vec3<f32>(0.0, 1.0, 0.0), forward);
    if length(right) < 0.001 {
        right = vec3<f32>(1.0, 0.0, 0.0);
    }
    right = normalize(right);
    let up = cross(forward, right);
    return mat3x3<f32>(right, up, forward);
}

// One corner (0..6) of a camera-facing quad along a segment
fn line_quad(a: vec3<f32>, b: vec3<f32>, width: f32, corner: u32) -> vec3<f32> {
    let dir = b - a;
    let to_camera = uniforms.camera.xyz - a;
    var side = cross(dir, to_camera);
    if length(side) < 0.0001 {
        side = cross(dir, vec3<f32>(0.0, 1.0, 0.0));
    }
    if length(side) < 0.0001 {
        side = vec3<f32>(1.0, 0.0, 0.0);
    }
    side = normalize(side) * width * 0.5;

    var pos: vec3<f32>;
    switch corner {
        case 0u: { pos = a - side; }
        case 1u: { pos = a + side; }
        case 2u: { pos = b - side; }
        case 3u: { pos = a + side; }
        case 4u: { pos = b + side; }
        default: { pos = b - side; }
    }
    return pos;
}
"#;

/// Prepend the shared uniform block to a pass's shader body.
pub fn shader_source(body: &str) -> String {
    format!("{}\n{}", FRAME_WGSL, body)
}

/// Growable per-pass instance buffer.
pub(crate) struct InstanceBuffer<T> {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
    len: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> InstanceBuffer<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            buffer: None,
            capacity: 0,
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        self.len = data.len() as u32;
        if data.is_empty() {
            return;
        }
        if self.buffer.is_none() || data.len() > self.capacity {
            let capacity = data.len().next_power_of_two().max(MIN_INSTANCES);
            if let Some(old) = self.buffer.take() {
                old.destroy();
            }
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: (capacity * std::mem::size_of::<T>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    /// The written part of the buffer, or `None` when there is nothing to draw.
    pub fn slice(&self) -> Option<wgpu::BufferSlice<'_>> {
        if self.len == 0 {
            return None;
        }
        let bytes = self.len as wgpu::BufferAddress * std::mem::size_of::<T>() as wgpu::BufferAddress;
        self.buffer.as_ref().map(|b| b.slice(..bytes))
    }

    pub fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.capacity = 0;
        self.len = 0;
    }
}

/// Shared settings for one instanced pipeline.
pub(crate) struct PipelineSpec<'a> {
    pub label: &'static str,
    pub shader_body: &'a str,
    pub stride: usize,
    pub attributes: &'a [wgpu::VertexAttribute],
    pub depth_write: bool,
}

pub(crate) fn create_instanced_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(spec.label),
        source: wgpu::ShaderSource::Wgsl(shader_source(spec.shader_body).into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: spec.stride as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: spec.attributes,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Window surface, device and the four passes.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    particles: particles::ParticlePass,
    floaters: wireframe::WireframePass,
    edges: connections::EdgePass,
    rings: shockwave::RingPass,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        log::info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Field Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let particles = particles::ParticlePass::new(&device, &pipeline_layout, config.format);
        let floaters = wireframe::WireframePass::new(&device, &pipeline_layout, config.format);
        let edges = connections::EdgePass::new(&device, &pipeline_layout, config.format);
        let rings = shockwave::RingPass::new(&device, &pipeline_layout, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            uniform_buffer,
            uniform_bind_group,
            particles,
            floaters,
            edges,
            rings,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn render_frame(&mut self, frame: &FrameGeometry) -> Result<(), wgpu::SurfaceError> {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&frame.uniforms));
        self.particles.upload(&self.device, &self.queue, &frame.particles);
        self.floaters.upload(&self.device, &self.queue, &frame.floaters);
        self.edges.upload(&self.device, &self.queue, &frame.edges);
        self.rings.upload(&self.device, &self.queue, &frame.rings);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let [r, g, b, _] = frame.uniforms.fog_color;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Field Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            // Opaque-ish bodies first, then the faint transparent layers
            self.floaters.draw(&mut render_pass);
            self.particles.draw(&mut render_pass);
            self.edges.draw(&mut render_pass);
            self.rings.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl RenderBackend for GpuState {
    fn resize(&mut self, width: u32, height: u32) {
        GpuState::resize(self, width, height);
    }

    fn render(&mut self, frame: &FrameGeometry) -> Result<(), RenderError> {
        self.render_frame(frame).map_err(RenderError::from)
    }

    fn release(&mut self) {
        self.particles.release();
        self.floaters.release();
        self.edges.release();
        self.rings.release();
    }
}

fn create_depth_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Parse and validate a shader body with the shared prelude.
#[cfg(test)]
pub(crate) fn validate_wgsl(body: &str) {
    let source = shader_source(body);
    let module = naga::front::wgsl::parse_str(&source).unwrap_or_else(|e| panic!("{}", e.emit_to_string(&source)));
    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{:?}", e));
}
