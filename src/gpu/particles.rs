//! Particles as lit, camera-facing hexagons.
//!
//! Each hexagon is a six-triangle fan built from `vertex_index`. The
//! fragment shader fakes a spherical normal from the fan coordinates so the
//! point lights shade particles like small gems.

use crate::scene::ParticleInstance;

use super::{create_instanced_pipeline, InstanceBuffer, PipelineSpec};

const VERTICES_PER_PARTICLE: u32 = 18;

const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32,
    2 => Float32x4,
    3 => Float32x4
];

pub const PARTICLE_SHADER: &str = r#"
struct ParticleIn {
    @location(0) position: vec3<f32>,
    @location(1) radius: f32,
    @location(2) color: vec4<f32>,
    @location(3) emissive: vec4<f32>,
};

struct ParticleOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) world_pos: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) emissive: vec3<f32>,
    @location(4) right: vec3<f32>,
    @location(5) up: vec3<f32>,
    @location(6) forward: vec3<f32>,
};

const TAU: f32 = 6.28318530718;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, particle: ParticleIn) -> ParticleOut {
    let tri = vertex_index / 3u;
    let corner = vertex_index % 3u;

    var local = vec2<f32>(0.0, 0.0);
    if corner != 0u {
        let angle = f32(tri + corner - 1u) * TAU / 6.0 + particle.emissive.w;
        local = vec2<f32>(cos(angle), sin(angle));
    }

    let basis = billboard_basis(particle.position);
    let world = particle.position + (basis[0] * local.x + basis[1] * local.y) * particle.radius;

    var out: ParticleOut;
    out.clip_position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.local = local;
    out.world_pos = world;
    out.color = particle.color;
    out.emissive = particle.emissive.rgb;
    out.right = basis[0];
    out.up = basis[1];
    out.forward = basis[2];
    return out;
}

@fragment
fn fs_main(in: ParticleOut) -> @location(0) vec4<f32> {
    let r2 = min(dot(in.local, in.local), 1.0);
    let normal = normalize(in.right * in.local.x + in.up * in.local.y + in.forward * sqrt(1.0 - r2));

    var light = uniforms.ambient.rgb * uniforms.ambient.w;
    for (var i = 0u; i < 3u; i = i + 1u) {
        let to_light = uniforms.light_positions[i].xyz - in.world_pos;
        let dir = to_light / max(length(to_light), 0.0001);
        let lambert = max(dot(normal, dir), 0.0);
        light += uniforms.light_colors[i].rgb * uniforms.light_positions[i].w * lambert;
    }

    let lit = in.color.rgb * light + in.emissive;
    return vec4<f32>(apply_fog(lit, in.world_pos), in.color.a);
}
"#;

pub(crate) struct ParticlePass {
    pipeline: wgpu::RenderPipeline,
    instances: InstanceBuffer<ParticleInstance>,
}

impl ParticlePass {
    pub fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> Self {
        let pipeline = create_instanced_pipeline(
            device,
            layout,
            format,
            PipelineSpec {
                label: "Particle Pipeline",
                shader_body: PARTICLE_SHADER,
                stride: std::mem::size_of::<ParticleInstance>(),
                attributes: &ATTRIBUTES,
                depth_write: true,
            },
        );
        Self {
            pipeline,
            instances: InstanceBuffer::new("Particle Instances"),
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[ParticleInstance]) {
        self.instances.upload(device, queue, data);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(slice) = self.instances.slice() {
            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(0, slice);
            pass.draw(0..VERTICES_PER_PARTICLE, 0..self.instances.len());
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
        super::super::validate_wgsl(PARTICLE_SHADER);
    }

    #[test]
    fn test_attributes_cover_instance() {
        let last = ATTRIBUTES[3];
        assert_eq!(last.offset as usize + 16, std::mem::size_of::<ParticleInstance>());
    }
}
