use super::buffer::{BufferError, ManagedBuffer};

// --- Uniforms ---
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    /// Column-major world to clip matrix.
    pub mvp: [[f32; 4]; 4],
    pub zoom: f32,
    /// 0..1 highlight strength applied to everything drawn with these uniforms.
    pub pulse: f32,
    /// WGSL struct padding.
    /// WebGL requires the uniform to be 16-byte aligned.
    pub _padding: [f32; 2],
}

/// Uniform slots per frame, one per layer, addressed with a dynamic offset.
pub const UNIFORM_SLOT_STRIDE: wgpu::BufferAddress = 256;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub quad_pos: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Two triangles covering `[-1, 1]²`.
pub const VERTICES: &[Vertex] = &[
    Vertex {
        quad_pos: [-1.0, -1.0],
    },
    Vertex {
        quad_pos: [1.0, -1.0],
    },
    Vertex {
        quad_pos: [1.0, 1.0],
    },
    Vertex {
        quad_pos: [-1.0, -1.0],
    },
    Vertex {
        quad_pos: [1.0, 1.0],
    },
    Vertex {
        quad_pos: [-1.0, 1.0],
    },
];

/// One per-element record that the instanced strategies feed at instance rate
/// and the array strategy expands into one vertex per quad corner.
pub trait QuadInstance: bytemuck::Pod {
    type Vertex: bytemuck::Pod;

    const LABEL: &'static str;

    /// Consecutive records written for one graph element.
    const RECORDS_PER_ELEMENT: u32;

    fn at_corner(&self, corner: [f32; 2]) -> Self::Vertex;

    /// Per-instance layout, paired with [`Vertex::desc`] in slot 0.
    fn instance_layout() -> wgpu::VertexBufferLayout<'static>;

    /// Layout of the expanded vertices, alone in slot 0.
    fn vertex_layout() -> wgpu::VertexBufferLayout<'static>;

    /// Shader with `vs_main` and `fs_main` entry points accepting either layout.
    fn shader() -> wgpu::ShaderModuleDescriptor<'static>;
}

/// Expands `instances` into six vertices each, appended to `out`.
pub fn expand_quads<I: QuadInstance>(
    instances: &[I],
    out: &mut ManagedBuffer<I::Vertex>,
) -> Result<(), BufferError> {
    out.ensure_capacity(out.len() + instances.len() * VERTICES.len())?;
    for instance in instances {
        for vertex in VERTICES {
            out.push(instance.at_corner(vertex.quad_pos))?;
        }
    }
    Ok(())
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeInstance {
    pub position: [f32; 2],
    pub radius: f32,
    /// Packed RGBA bits, see [`crate::graph_data::Rgba::to_f32_bits`].
    pub color: f32,
}

impl NodeInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32, 3 => Float32];

    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// [`NodeInstance`] fields repeated per corner for non-instanced drawing.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeVertex {
    pub quad_pos: [f32; 2],
    pub instance: NodeInstance,
}

impl NodeVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32, 3 => Float32];

    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl QuadInstance for NodeInstance {
    type Vertex = NodeVertex;

    const LABEL: &'static str = "node";

    // Outer ring, then inner fill.
    const RECORDS_PER_ELEMENT: u32 = 2;

    fn at_corner(&self, corner: [f32; 2]) -> NodeVertex {
        NodeVertex {
            quad_pos: corner,
            instance: *self,
        }
    }

    fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
        Self::desc()
    }

    fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        NodeVertex::desc()
    }

    fn shader() -> wgpu::ShaderModuleDescriptor<'static> {
        wgpu::include_wgsl!("node_shader.wgsl")
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EdgeInstance {
    pub source: [f32; 2],
    pub target: [f32; 2],
    /// World-space line width.
    pub width: f32,
    pub color: f32,
}

impl EdgeInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // source
        2 => Float32x2, // target
        3 => Float32,   // width
        4 => Float32,   // color
    ];

    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EdgeVertex {
    pub quad_pos: [f32; 2],
    pub instance: EdgeInstance,
}

impl EdgeVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32,
        4 => Float32,
    ];

    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl QuadInstance for EdgeInstance {
    type Vertex = EdgeVertex;

    const LABEL: &'static str = "edge";

    const RECORDS_PER_ELEMENT: u32 = 1;

    fn at_corner(&self, corner: [f32; 2]) -> EdgeVertex {
        EdgeVertex {
            quad_pos: corner,
            instance: *self,
        }
    }

    fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
        Self::desc()
    }

    fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        EdgeVertex::desc()
    }

    fn shader() -> wgpu::ShaderModuleDescriptor<'static> {
        wgpu::include_wgsl!("edge_shader.wgsl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_data::Rgba;

    #[test]
    fn expansion_keeps_color_bits() {
        // 0x7fc0_0001 reads as a NaN float.
        let color = Rgba::new(0x01, 0x00, 0xc0, 0x7f);
        let node = NodeInstance {
            position: [3.0, 4.0],
            radius: 2.0,
            color: color.to_f32_bits(),
        };
        let mut out = ManagedBuffer::default();
        expand_quads(&[node, node], &mut out).unwrap();

        assert_eq!(out.len(), 12);
        assert_eq!(out.as_slice()[2].quad_pos, VERTICES[2].quad_pos);
        for vertex in out.as_slice() {
            assert_eq!(Rgba::from_f32_bits(vertex.instance.color), color);
        }
    }

    #[test]
    fn layouts_match_record_sizes() {
        assert_eq!(std::mem::size_of::<ViewUniforms>() % 16, 0);
        assert_eq!(NodeVertex::desc().array_stride, 24);
        assert_eq!(EdgeInstance::desc().array_stride, 24);
        assert_eq!(EdgeVertex::desc().array_stride, 32);
    }
}
