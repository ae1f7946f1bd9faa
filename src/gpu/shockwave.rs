//! Shockwaves as flat camera-facing rings.

use crate::scene::RingInstance;

use super::{create_instanced_pipeline, InstanceBuffer, PipelineSpec};

const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32,
    2 => Float32x3,
    3 => Float32
];

pub const RING_SHADER: &str = r#"
struct RingIn {
    @location(0) center: vec3<f32>,
    @location(1) radius: f32,
    @location(2) color: vec3<f32>,
    @location(3) opacity: f32,
};

struct RingOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, ring: RingIn) -> RingOut {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let local = quad_vertices[vertex_index];
    let basis = billboard_basis(ring.center);
    let world = ring.center + (basis[0] * local.x + basis[1] * local.y) * ring.radius;

    var out: RingOut;
    out.clip_position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.local = local;
    out.color = vec4<f32>(ring.color, ring.opacity);
    return out;
}

@fragment
fn fs_main(in: RingOut) -> @location(0) vec4<f32> {
    let r = length(in.local);
    if r > 1.0 || r < uniforms.params.w {
        discard;
    }
    return in.color;
}
"#;

pub(crate) struct RingPass {
    pipeline: wgpu::RenderPipeline,
    instances: InstanceBuffer<RingInstance>,
}

impl RingPass {
    pub fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> Self {
        let pipeline = create_instanced_pipeline(
            device,
            layout,
            format,
            PipelineSpec {
                label: "Shockwave Pipeline",
                shader_body: RING_SHADER,
                stride: std::mem::size_of::<RingInstance>(),
                attributes: &ATTRIBUTES,
                depth_write: false,
            },
        );
        Self {
            pipeline,
            instances: InstanceBuffer::new("Shockwave Instances"),
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[RingInstance]) {
        self.instances.upload(device, queue, data);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(slice) = self.instances.slice() {
            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(0, slice);
            pass.draw(0..6, 0..self.instances.len());
        }
    }

    pub fn release(&mut self) {
        self.instances.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_is_valid() {
        super::super::validate_wgsl(RING_SHADER);
    }
}
