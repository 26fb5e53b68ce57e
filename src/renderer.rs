pub mod buffer;
pub mod capabilities;
pub mod commands;
pub mod counter;
pub mod edges;
pub mod events;
pub mod executor;
pub mod frame;
pub mod instances;
pub mod layer;
pub mod nodes;
pub mod strategy;
pub mod vertex_buffer;

use crate::config::EngineOptions;
use crate::error::EngineError;
use crate::event_dispatcher::EventDispatcher;
use crate::graph_data::GraphStore;
use crate::scene::Scene;
use capabilities::Capabilities;
use edges::{EdgeFilter, EdgeWidths, build_edge_instances};
use events::RenderEvent;
use executor::{CategoryRenderer, ViewBindings};
use frame::{FrameClock, FrameContext};
use glam::Vec2;
use instances::Palette;
use layer::Layer;
use log::{info, warn};
use nodes::build_node_instances;
use std::cmp::min;
use std::sync::Arc;
use strategy::{Category, StrategyKind, StrategyRegistry, StrategyTag};
use strum::IntoEnumIterator;
use vertex_buffer::{EdgeInstance, NodeInstance, ViewUniforms};

/// The renderer chosen for one category.
enum Executor {
    Nodes(CategoryRenderer<NodeInstance>),
    Edges(CategoryRenderer<EdgeInstance>),
}

impl Executor {
    fn new(tag: StrategyTag) -> Self {
        match tag.category {
            Category::Nodes => Self::Nodes(CategoryRenderer::new(tag)),
            Category::Edges => Self::Edges(CategoryRenderer::new(tag)),
        }
    }

    fn tag(&self) -> StrategyTag {
        match self {
            Self::Nodes(r) => r.tag(),
            Self::Edges(r) => r.tag(),
        }
    }

    fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, view: &ViewBindings) {
        match self {
            Self::Nodes(r) => r.init(device, format, view),
            Self::Edges(r) => r.init(device, format, view),
        }
    }

    fn render(&self, pass: &mut wgpu::RenderPass<'_>, layer: Layer, view: &ViewBindings) {
        match self {
            Self::Nodes(r) => r.render(pass, layer, view),
            Self::Edges(r) => r.render(pass, layer, view),
        }
    }

    fn dispose(&mut self) {
        match self {
            Self::Nodes(r) => r.dispose(),
            Self::Edges(r) => r.dispose(),
        }
    }
}

/// Picks one strategy per category. Categories without any available
/// strategy are left out and render nothing.
fn select_executors(
    registry: &StrategyRegistry,
    capabilities: &Capabilities,
    options: &EngineOptions,
) -> Vec<Executor> {
    let mut executors: Vec<Executor> = Category::iter()
        .filter_map(|category| match registry.select(category, capabilities, options) {
            Some(kind) => {
                info!("{category} rendered with {kind}");
                Some(Executor::new(StrategyTag { category, kind }))
            }
            None => {
                warn!("No available strategy for {category}, it will not be drawn");
                None
            }
        })
        .collect();
    executors.sort_by_key(|executor| executor.tag().category.order());
    executors
}

/// Surface size for a requested target size, clamped to the device's
/// texture limit. `None` while either side is zero.
fn surface_extent(width: u32, height: u32, max_size: u32) -> Option<(u32, u32)> {
    (width > 0 && height > 0).then(|| (min(width, max_size), min(height, max_size)))
}

/// Owns the GPU context of one rendering target and drives
/// `frame_start -> world_update -> render -> frame_end`.
pub struct VizEngine {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    is_surface_configured: bool,
    capabilities: Capabilities,
    view: ViewBindings,
    executors: Vec<Executor>,
    scene: Scene,
    clock: FrameClock,
    events: EventDispatcher,
}

impl VizEngine {
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        store: Arc<GraphStore>,
        options: EngineOptions,
    ) -> anyhow::Result<Self> {
        Self::with_registry(target, size, store, options, &StrategyRegistry::with_defaults()).await
    }

    pub async fn with_registry(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        (width, height): (u32, u32),
        store: Arc<GraphStore>,
        options: EngineOptions,
        registry: &StrategyRegistry,
    ) -> anyhow::Result<Self> {
        // Check if we can use WebGPU (as of this writing it's only enabled in some browsers)
        let is_webgpu_enabled = wgpu::util::is_browser_webgpu_supported().await;

        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        let backends = if is_webgpu_enabled {
            wgpu::Backends::BROWSER_WEBGPU
        } else if cfg!(target_arch = "wasm32") {
            wgpu::Backends::GL
        } else {
            wgpu::Backends::PRIMARY
        };

        info!("Building render state (WebGPU={is_webgpu_enabled})");

        let flags = if options.debug_context {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::from_build_config()
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags,
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let capabilities = Capabilities::from_adapter(&adapter);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: capabilities.required_features(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for a browser not supporting WebGPU,
                // we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") && !is_webgpu_enabled {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits {
                        max_buffer_size: 1_073_741_824,
                        ..Default::default()
                    }
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colors are packed as display values, so skip the sRGB conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no texture formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            // Always configure surface, even if size is zero
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let view = ViewBindings::new(&device);
        let mut executors = select_executors(registry, &capabilities, &options);
        for executor in &mut executors {
            executor.init(&device, config.format, &view);
        }

        let scene = Scene::new(
            store,
            options,
            Vec2::new(config.width as f32, config.height as f32),
        )?;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            is_surface_configured: true,
            capabilities,
            view,
            executors,
            scene,
            clock: FrameClock::new(),
            events: EventDispatcher::new(),
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// The strategy drawing `category`, if any.
    pub fn strategy(&self, category: Category) -> Option<StrategyKind> {
        self.executors
            .iter()
            .map(Executor::tag)
            .find(|tag| tag.category == category)
            .map(|tag| tag.kind)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Input actions (picking, pan, zoom) go through the scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Sender for events applied at the start of the next frame.
    pub fn event_sender(&self) -> flume::Sender<RenderEvent> {
        self.events.sender()
    }

    /// Reconfigures the surface. A zero-sized target (a minimized window)
    /// pauses rendering until the next non-empty resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        let max_size = self.device.limits().max_texture_dimension_2d;
        let Some((width, height)) = surface_extent(width, height, max_size) else {
            self.is_surface_configured = false;
            return;
        };
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.is_surface_configured = true;
        self.scene.resize(width as f32, height as f32);
    }

    /// Runs one full frame.
    pub fn frame(&mut self) -> Result<(), EngineError> {
        let context = self.frame_start()?;
        self.world_update(&context)?;
        self.render(&context)?;
        self.frame_end(&context);
        Ok(())
    }

    /// Applies queued host events and advances the clock.
    pub fn frame_start(&mut self) -> Result<FrameContext, EngineError> {
        for event in self.events.drain() {
            self.scene.apply(event)?;
        }
        Ok(self.clock.tick())
    }

    /// Rebuilds and uploads every category's records for the current view
    /// and selection, then the view uniforms.
    pub fn world_update(&mut self, context: &FrameContext) -> Result<(), EngineError> {
        let view = self.scene.view_boundaries();
        let options = self.scene.options();
        let selection = self.scene.selection();
        let index = self.scene.index();
        let palette = Palette::new(options, selection);

        for executor in &mut self.executors {
            match executor {
                Executor::Edges(renderer) => {
                    let widths = EdgeWidths::new(options, index.edge_weight_range());
                    {
                        let visible = index.visible_edges(&view)?;
                        build_edge_instances(
                            visible.iter(),
                            selection,
                            &palette,
                            &widths,
                            EdgeFilter::from(options),
                            renderer.records_mut(),
                        )?;
                    }
                    renderer.upload(&self.device, &self.queue)?;
                }
                Executor::Nodes(renderer) => {
                    {
                        let visible = index.visible_nodes(&view)?;
                        build_node_instances(
                            visible.iter(),
                            selection,
                            &palette,
                            renderer.records_mut(),
                        )?;
                    }
                    renderer.upload(&self.device, &self.queue)?;
                }
            }
        }

        let camera = self.scene.camera();
        let uniforms = ViewUniforms {
            mvp: camera.model_view_projection().to_cols_array_2d(),
            zoom: camera.zoom(),
            pulse: 0.0,
            _padding: [0.0; 2],
        };
        self.view.write(&self.queue, Layer::Back, &uniforms);
        self.view.write(
            &self.queue,
            Layer::Middle,
            &ViewUniforms {
                pulse: context.pulse(),
                ..uniforms
            },
        );
        Ok(())
    }

    /// Draws every layer in order; within a layer the executors draw in
    /// category order.
    pub fn render(&mut self, _context: &FrameContext) -> Result<(), EngineError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let [r, g, b, a] = self.scene.options().background_color.to_unorm();
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(r),
                            g: f64::from(g),
                            b: f64::from(b),
                            a: f64::from(a),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for layer in Layer::ORDERED {
                for executor in &self.executors {
                    executor.render(&mut render_pass, layer, &self.view);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    pub fn frame_end(&mut self, context: &FrameContext) {
        if context.frame % 600 == 0 {
            log::debug!("Frame {} at {:?}", context.frame, context.elapsed);
        }
    }
}

impl Drop for VizEngine {
    fn drop(&mut self) {
        for executor in &mut self.executors {
            executor.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(options: &EngineOptions) -> Vec<StrategyTag> {
        select_executors(&StrategyRegistry::with_defaults(), &Capabilities::ALL, options)
            .iter()
            .map(Executor::tag)
            .collect()
    }

    #[test]
    fn edges_are_drawn_before_nodes() {
        let tags = selected(&EngineOptions::default());
        assert_eq!(
            tags,
            [
                StrategyTag {
                    category: Category::Edges,
                    kind: StrategyKind::Indirect
                },
                StrategyTag {
                    category: Category::Nodes,
                    kind: StrategyKind::Indirect
                },
            ]
        );
    }

    #[test]
    fn categories_without_a_strategy_are_left_out() {
        let options = EngineOptions::builder()
            .disable_indirect_drawing(true)
            .disable_instanced_drawing(true)
            .disable_vertex_arrays(true)
            .build();
        assert!(selected(&options).is_empty());

        let mut registry = StrategyRegistry::new();
        registry.register(StrategyTag {
            category: Category::Nodes,
            kind: StrategyKind::Instanced,
        });
        let executors = select_executors(&registry, &Capabilities::MINIMAL, &EngineOptions::default());
        assert!(executors.is_empty());
    }

    #[test]
    fn zero_sized_targets_pause_rendering() {
        assert_eq!(surface_extent(0, 600, 8192), None);
        assert_eq!(surface_extent(800, 0, 8192), None);
        assert_eq!(surface_extent(800, 600, 8192), Some((800, 600)));
        assert_eq!(surface_extent(10_000, 600, 8192), Some((8192, 600)));
    }
}
