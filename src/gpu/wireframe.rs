//! Floaters as rotating wireframe octahedra.
//!
//! One instance per floater; the vertex shader walks the twelve octahedron
//! edges and expands each into a camera-facing line quad.

use crate::scene::FloaterInstance;

use super::{create_instanced_pipeline, InstanceBuffer, PipelineSpec};

const EDGES_PER_MESH: u32 = 12;
const VERTICES_PER_FLOATER: u32 = EDGES_PER_MESH * 6;

const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32,
    2 => Float32x4,
    3 => Float32x4
];

pub const WIREFRAME_SHADER: &str = r#"
struct FloaterIn {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) rotation: vec4<f32>,
    @location(3) color: vec4<f32>,
};

struct LineOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) world_pos: vec3<f32>,
};

const WIRE_WIDTH_SCALE: f32 = 2.0;

fn octahedron_vertex(i: u32) -> vec3<f32> {
    var verts = array<vec3<f32>, 6>(
        vec3<f32>(1.0, 0.0, 0.0),
        vec3<f32>(-1.0, 0.0, 0.0),
        vec3<f32>(0.0, 1.0, 0.0),
        vec3<f32>(0.0, -1.0, 0.0),
        vec3<f32>(0.0, 0.0, 1.0),
        vec3<f32>(0.0, 0.0, -1.0),
    );
    return verts[i];
}

fn octahedron_edge(i: u32) -> vec2<u32> {
    var edges = array<vec2<u32>, 12>(
        vec2<u32>(0u, 2u), vec2<u32>(0u, 3u), vec2<u32>(0u, 4u), vec2<u32>(0u, 5u),
        vec2<u32>(1u, 2u), vec2<u32>(1u, 3u), vec2<u32>(1u, 4u), vec2<u32>(1u, 5u),
        vec2<u32>(2u, 4u), vec2<u32>(2u, 5u), vec2<u32>(3u, 4u), vec2<u32>(3u, 5u),
    );
    return edges[i];
}

// Euler XYZ: rotate about Z, then Y, then X
fn rotate_xyz(v: vec3<f32>, r: vec3<f32>) -> vec3<f32> {
    let cz = cos(r.z);
    let sz = sin(r.z);
    var p = vec3<f32>(v.x * cz - v.y * sz, v.x * sz + v.y * cz, v.z);
    let cy = cos(r.y);
    let sy = sin(r.y);
    p = vec3<f32>(p.x * cy + p.z * sy, p.y, -p.x * sy + p.z * cy);
    let cx = cos(r.x);
    let sx = sin(r.x);
    p = vec3<f32>(p.x, p.y * cx - p.z * sx, p.y * sx + p.z * cx);
    return p;
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, floater: FloaterIn) -> LineOut {
    let edge = octahedron_edge(vertex_index / 6u);
    let corner = vertex_index % 6u;

    let a = floater.position + rotate_xyz(octahedron_vertex(edge.x), floater.rotation.xyz) * floater.size;
    let b = floater.position + rotate_xyz(octahedron_vertex(edge.y), floater.rotation.xyz) * floater.size;
    let pos = line_quad(a, b, uniforms.params.z * WIRE_WIDTH_SCALE, corner);

    var out: LineOut;
    out.clip_position = uniforms.view_proj * vec4<f32>(pos, 1.0);
    out.color = floater.color;
    out.world_pos = pos;
    return out;
}

@fragment
fn fs_main(in: LineOut) -> @location(0) vec4<f32> {
    let glow = in.color.rgb * (1.0 + uniforms.ambient.w);
    return vec4<f32>(apply_fog(glow, in.world_pos), in.color.a);
}
"#;

pub(crate) struct WireframePass {
    pipeline: wgpu::RenderPipeline,
    instances: InstanceBuffer<FloaterInstance>,
}

impl WireframePass {
    pub fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> Self {
        let pipeline = create_instanced_pipeline(
            device,
            layout,
            format,
            PipelineSpec {
                label: "Floater Wireframe Pipeline",
                shader_body: WIREFRAME_SHADER,
                stride: std::mem::size_of::<FloaterInstance>(),
                attributes: &ATTRIBUTES,
                depth_write: true,
            },
        );
        Self {
            pipeline,
            instances: InstanceBuffer::new("Floater Instances"),
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[FloaterInstance]) {
        self.instances.upload(device, queue, data);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(slice) = self.instances.slice() {
            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(0, slice);
            pass.draw(0..VERTICES_PER_FLOATER, 0..self.instances.len());
        }
    }

    pub fn release(&mut self) {
        self.instances.release();
    }
}
