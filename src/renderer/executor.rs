//! Draw-time side of a selected strategy: owns the GPU buffers of one
//! category and turns its draw plan into render pass calls.

use super::buffer::{GpuBuffer, ManagedBuffer};
use super::commands::{DrawCall, QUAD_VERTICES, build_commands, plan_draw};
use super::counter::{InstanceCounter, PartitionCounts};
use super::instances::PartitionedInstances;
use super::layer::Layer;
use super::strategy::{StrategyKind, StrategyTag};
use super::vertex_buffer::{
    QuadInstance, UNIFORM_SLOT_STRIDE, VERTICES, Vertex, ViewUniforms, expand_quads,
};
use crate::error::EngineError;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    Uninitialized,
    /// GPU resources exist, nothing uploaded yet.
    Initialized,
    /// Takes part in frame updates and rendering.
    Active,
    Disposed,
}

impl ExecutorState {
    fn after_upload(self) -> Result<Self, EngineError> {
        match self {
            Self::Initialized | Self::Active => Ok(Self::Active),
            Self::Uninitialized | Self::Disposed => Err(EngineError::NotInitialized),
        }
    }
}

/// Per-target resources every executor binds: the view uniforms (one slot
/// per layer) and the shared unit quad.
pub struct ViewBindings {
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniforms: wgpu::Buffer,
    quad: wgpu::Buffer,
}

impl ViewBindings {
    const UNIFORM_SIZE: u64 = std::mem::size_of::<ViewUniforms>() as u64;

    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("view_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(Self::UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("view_uniform_buffer"),
            size: UNIFORM_SLOT_STRIDE * Layer::ORDERED.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniforms,
                    offset: 0,
                    size: NonZeroU64::new(Self::UNIFORM_SIZE),
                }),
            }],
            label: Some("view_bind_group"),
        });

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            layout,
            bind_group,
            uniforms,
            quad,
        }
    }

    fn slot(layer: Layer) -> u32 {
        match layer {
            Layer::Back => 0,
            Layer::Middle => UNIFORM_SLOT_STRIDE as u32,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, layer: Layer, uniforms: &ViewUniforms) {
        queue.write_buffer(
            &self.uniforms,
            u64::from(Self::slot(layer)),
            bytemuck::cast_slice(&[*uniforms]),
        );
    }
}

struct GpuResources {
    pipeline: wgpu::RenderPipeline,
    /// Instance records, or expanded vertices for array drawing.
    records: GpuBuffer,
    commands: Option<GpuBuffer>,
}

impl GpuResources {
    fn destroy(&self) {
        self.records.destroy();
        if let Some(commands) = &self.commands {
            commands.destroy();
        }
    }
}

/// Renders one category with the strategy chosen for it.
pub struct CategoryRenderer<I: QuadInstance> {
    tag: StrategyTag,
    state: ExecutorState,
    records: PartitionedInstances<I>,
    expanded: ManagedBuffer<I::Vertex>,
    counter: InstanceCounter,
    gpu: Option<GpuResources>,
}

impl<I: QuadInstance> CategoryRenderer<I> {
    pub fn new(tag: StrategyTag) -> Self {
        Self {
            tag,
            state: ExecutorState::Uninitialized,
            records: PartitionedInstances::default(),
            expanded: ManagedBuffer::default(),
            counter: InstanceCounter::default(),
            gpu: None,
        }
    }

    pub fn tag(&self) -> StrategyTag {
        self.tag
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Position among the renderers of a layer; lower draws first.
    pub fn order(&self) -> i32 {
        self.tag.category.order()
    }

    /// Records for the next upload. Filled by the frame update.
    pub fn records_mut(&mut self) -> &mut PartitionedInstances<I> {
        &mut self.records
    }

    /// Counts the draw step currently uses.
    pub fn drawn_counts(&self) -> PartitionCounts {
        self.counter.to_draw()
    }

    pub fn draw_call(&self, layer: Layer) -> Option<DrawCall> {
        plan_draw(self.tag.kind, self.counter.to_draw(), I::RECORDS_PER_ELEMENT, layer)
    }

    /// Creates the pipeline and buffers. Only the first call has an effect.
    pub fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, view: &ViewBindings) {
        if self.state != ExecutorState::Uninitialized {
            log::warn!("{} already initialized ({:?})", self.tag, self.state);
            return;
        }

        let shader = device.create_shader_module(I::shader());
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(I::LABEL),
            bind_group_layouts: &[&view.layout],
            push_constant_ranges: &[],
        });
        let instanced = [Vertex::desc(), I::instance_layout()];
        let expanded = [I::vertex_layout()];
        let buffers: &[wgpu::VertexBufferLayout<'static>] = match self.tag.kind {
            StrategyKind::ArrayDraw => &expanded,
            StrategyKind::Instanced | StrategyKind::Indirect => &instanced,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(I::LABEL),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Edge quads flip winding with their direction.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let records = GpuBuffer::new(device, I::LABEL, wgpu::BufferUsages::VERTEX);
        let commands = (self.tag.kind == StrategyKind::Indirect)
            .then(|| GpuBuffer::new(device, "indirect_command_buffer", wgpu::BufferUsages::INDIRECT));

        self.gpu = Some(GpuResources {
            pipeline,
            records,
            commands,
        });
        self.state = ExecutorState::Initialized;
        log::debug!("{} initialized", self.tag);
    }

    /// Uploads the used range of the staged records, then promotes the
    /// counts so that the next render draws them.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<(), EngineError> {
        let next = self.state.after_upload()?;
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(EngineError::NotInitialized);
        };

        let counts = self.records.counts();
        self.counter.set(counts);
        match self.tag.kind {
            StrategyKind::ArrayDraw => {
                self.expanded.clear();
                expand_quads(self.records.records(), &mut self.expanded)?;
                gpu.records.upload(device, queue, self.expanded.as_bytes())?;
            }
            StrategyKind::Instanced => {
                gpu.records.upload(device, queue, self.records.as_bytes())?;
            }
            StrategyKind::Indirect => {
                gpu.records.upload(device, queue, self.records.as_bytes())?;
                if let Some(commands) = gpu.commands.as_mut() {
                    commands.upload(
                        device,
                        queue,
                        bytemuck::cast_slice(&build_commands(counts, I::RECORDS_PER_ELEMENT)),
                    )?;
                }
            }
        }

        self.counter.promote();
        self.state = next;
        Ok(())
    }

    /// Draws the partition belonging to `layer`. Nothing is issued for an
    /// empty partition or an inactive renderer.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>, layer: Layer, view: &ViewBindings) {
        if self.state != ExecutorState::Active {
            return;
        }
        let (Some(gpu), Some(call)) = (self.gpu.as_ref(), self.draw_call(layer)) else {
            return;
        };

        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &view.bind_group, &[ViewBindings::slot(layer)]);

        match call {
            DrawCall::Vertices {
                first_vertex,
                vertex_count,
            } => {
                pass.set_vertex_buffer(0, gpu.records.buffer().slice(..));
                pass.draw(first_vertex..first_vertex + vertex_count, 0..1);
            }
            DrawCall::Instances {
                first_instance,
                instance_count,
            } => {
                // Offsetting the binding instead of the instance range keeps
                // this path free of base-instance support.
                let stride = std::mem::size_of::<I>() as wgpu::BufferAddress;
                let offset = wgpu::BufferAddress::from(first_instance) * stride;
                pass.set_vertex_buffer(0, view.quad.slice(..));
                pass.set_vertex_buffer(1, gpu.records.buffer().slice(offset..));
                pass.draw(0..QUAD_VERTICES, 0..instance_count);
            }
            DrawCall::Indirect { index } => {
                let Some(commands) = gpu.commands.as_ref() else {
                    return;
                };
                pass.set_vertex_buffer(0, view.quad.slice(..));
                pass.set_vertex_buffer(1, gpu.records.buffer().slice(..));
                pass.draw_indirect(commands.buffer(), DrawCall::indirect_offset(index));
            }
        }
    }

    /// Releases GPU resources. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.destroy();
            log::debug!("{} disposed", self.tag);
        }
        self.counter.reset();
        self.state = ExecutorState::Disposed;
    }
}
