//! Windowed demo: a generated graph with pan, zoom and selection.

use crate::config::EngineOptions;
use crate::error::EngineError;
use crate::graph_data::{GraphModel, GraphStore, Rgba};
use crate::input::{InputAction, InputState};
use crate::renderer::VizEngine;
use glam::Vec2;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

const DEMO_NODES: u32 = 2000;
const DEMO_SPREAD: f32 = 1500.0;

const PALETTE: [Rgba; 5] = [
    Rgba::new(0xac, 0xcb, 0xfa, 0xff),
    Rgba::new(0x33, 0x66, 0xcc, 0xff),
    Rgba::new(0xff, 0xcc, 0x33, 0xff),
    Rgba::new(0x99, 0xcc, 0x66, 0xff),
    Rgba::new(0xcc, 0x66, 0x66, 0xff),
];

/// Deterministic pseudo-random value in `0..1`.
fn hash(i: u32, salt: f32) -> f32 {
    f32::fract(f32::sin(i as f32 + 1.0) * salt).abs()
}

/// Scattered nodes, each linked to a few earlier ones.
pub fn demo_graph(node_count: u32) -> GraphModel {
    let mut graph = GraphModel::with_weight_index();
    let ids: Vec<_> = (0..node_count)
        .map(|i| {
            let position = Vec2::new(
                (hash(i, 12345.6789) - 0.5) * 2.0 * DEMO_SPREAD,
                (hash(i, 98765.4321) - 0.5) * 2.0 * DEMO_SPREAD,
            );
            let size = 4.0 + hash(i, 4321.123) * 10.0;
            graph.add_node(position, size, PALETTE[i as usize % PALETTE.len()])
        })
        .collect();

    for (i, &id) in ids.iter().enumerate().skip(1) {
        let links = 1 + (hash(i as u32, 777.77) * 2.0) as usize;
        for k in 0..links {
            let other = ids[(hash(i as u32 + k as u32, 3131.31) * i as f32) as usize % i];
            let weight = 1.0 + hash(i as u32, 55.5) * 9.0;
            if let Err(err) = graph.add_edge(id, other, weight, Rgba::new(0x80, 0x80, 0x90, 0xff)) {
                log::warn!("Skipping demo edge: {err}");
            }
        }
    }
    graph
}

struct App {
    options: EngineOptions,
    store: Arc<GraphStore>,
    window: Option<Arc<Window>>,
    engine: Option<VizEngine>,
    input: InputState,
}

impl App {
    fn new(options: EngineOptions) -> Self {
        Self {
            options,
            store: Arc::new(GraphStore::new(demo_graph(DEMO_NODES))),
            window: None,
            engine: None,
            input: InputState::default(),
        }
    }

    fn perform(&mut self, action: Option<InputAction>) {
        let (Some(action), Some(engine)) = (action, self.engine.as_mut()) else {
            return;
        };
        if let Err(err) = action.apply(engine.scene_mut()) {
            log::error!("Input action {action:?} failed: {err}");
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes().with_title("viz-demo");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Unable to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let engine = pollster::block_on(VizEngine::new(
            window.clone(),
            (size.width, size.height),
            self.store.clone(),
            self.options.clone(),
        ));
        match engine {
            Ok(mut engine) => {
                if let Err(err) = engine.scene_mut().fit() {
                    log::error!("Unable to fit graph: {err}");
                }
                self.engine = Some(engine);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("Unable to create renderer: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.engine.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let action = self.input.handle_scroll(delta);
                self.perform(action);
            }
            WindowEvent::RedrawRequested => {
                let (Some(engine), Some(window)) = (self.engine.as_mut(), self.window.as_ref()) else {
                    return;
                };
                match engine.frame() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(EngineError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                        let size = window.inner_size();
                        engine.resize(size.width, size.height);
                    }
                    // The system is out of memory, we should probably quit
                    Err(EngineError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        log::error!("Out of memory while rendering!");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {e}");
                    }
                }
                window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let action = self.input.handle_key(code, key_state.is_pressed());
                self.perform(action);
            }
            WindowEvent::MouseInput {
                button,
                state: button_state,
                ..
            } => {
                let action = self.input.handle_mouse_key(button, button_state.is_pressed());
                self.perform(action);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let action = self.input.handle_cursor(position);
                self.perform(action);
            }
            _ => {}
        }
    }
}

pub fn run(options: EngineOptions) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(options);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_graph_is_connected_enough() {
        let graph = demo_graph(200);
        assert_eq!(graph.node_count(), 200);
        assert!(graph.edge_count() >= 199);
        assert!(graph.indexed_weight_range().is_some());
        assert!(graph
            .nodes()
            .all(|n| n.position.x.abs() <= DEMO_SPREAD && n.position.y.abs() <= DEMO_SPREAD));
    }
}
