//! Draw planning. Everything here is plain data; the executors turn it into
//! render pass calls.

use super::counter::PartitionCounts;
use super::layer::Layer;
use super::strategy::StrategyKind;
use super::vertex_buffer::VERTICES;

/// Vertices per quad.
pub const QUAD_VERTICES: u32 = VERTICES.len() as u32;

/// Indirect draw arguments, laid out as the GPU consumes them.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawCommand {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

impl DrawCommand {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<Self>() as wgpu::BufferAddress;
}

/// One command per partition: `[unselected, selected]`. `counts` are
/// element counts; each element spans `records_per_element` instances.
pub fn build_commands(counts: PartitionCounts, records_per_element: u32) -> [DrawCommand; 2] {
    let counts = counts.records(records_per_element);
    [
        DrawCommand {
            vertex_count: QUAD_VERTICES,
            instance_count: counts.unselected,
            first_vertex: 0,
            first_instance: 0,
        },
        DrawCommand {
            vertex_count: QUAD_VERTICES,
            instance_count: counts.selected,
            first_vertex: 0,
            first_instance: counts.unselected,
        },
    ]
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawCall {
    /// A range of CPU-expanded vertices.
    Vertices { first_vertex: u32, vertex_count: u32 },
    /// The quad instanced over a range of records.
    Instances {
        first_instance: u32,
        instance_count: u32,
    },
    /// The command at `index` in the command buffer.
    Indirect { index: u32 },
}

impl DrawCall {
    pub fn indirect_offset(index: u32) -> wgpu::BufferAddress {
        wgpu::BufferAddress::from(index) * DrawCommand::SIZE
    }
}

/// The draw for `layer`: the unselected partition on the back layer, the
/// selected one on the middle layer. `None` for an empty partition.
pub fn plan_draw(
    kind: StrategyKind,
    counts: PartitionCounts,
    records_per_element: u32,
    layer: Layer,
) -> Option<DrawCall> {
    let counts = counts.records(records_per_element);
    let (first, count, index) = match layer {
        Layer::Back => (0, counts.unselected, 0),
        Layer::Middle => (counts.unselected, counts.selected, 1),
    };
    if count == 0 {
        return None;
    }
    Some(match kind {
        StrategyKind::ArrayDraw => DrawCall::Vertices {
            first_vertex: first * QUAD_VERTICES,
            vertex_count: count * QUAD_VERTICES,
        },
        StrategyKind::Instanced => DrawCall::Instances {
            first_instance: first,
            instance_count: count,
        },
        StrategyKind::Indirect => DrawCall::Indirect { index },
    })
}
