//! Connection edges as thin camera-facing line quads.

use crate::scene::EdgeInstance;

use super::{create_instanced_pipeline, InstanceBuffer, PipelineSpec};

const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32,
    2 => Float32x3,
    3 => Float32,
    4 => Float32x4
];

pub const EDGE_SHADER: &str = r#"
struct EdgeIn {
    @location(0) start: vec3<f32>,
    @location(1) opacity: f32,
    @location(2) end: vec3<f32>,
    @location(4) color: vec4<f32>,
};

struct EdgeOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) world_pos: vec3<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, edge: EdgeIn) -> EdgeOut {
    let pos = line_quad(edge.start, edge.end, uniforms.params.z, vertex_index);

    var out: EdgeOut;
    out.clip_position = uniforms.view_proj * vec4<f32>(pos, 1.0);
    out.color = vec4<f32>(edge.color.rgb, edge.color.a * edge.opacity);
    out.world_pos = pos;
    return out;
}

@fragment
fn fs_main(in: EdgeOut) -> @location(0) vec4<f32> {
    return vec4<f32>(apply_fog(in.color.rgb, in.world_pos), in.color.a);
}
"#;

pub(crate) struct EdgePass {
    pipeline: wgpu::RenderPipeline,
    instances: InstanceBuffer<EdgeInstance>,
}

impl EdgePass {
    pub fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> Self {
        let pipeline = create_instanced_pipeline(
            device,
            layout,
            format,
            PipelineSpec {
                label: "Connection Pipeline",
                shader_body: EDGE_SHADER,
                stride: std::mem::size_of::<EdgeInstance>(),
                attributes: &ATTRIBUTES,
                depth_write: false,
            },
        );
        Self {
            pipeline,
            instances: InstanceBuffer::new("Connection Instances"),
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[EdgeInstance]) {
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
