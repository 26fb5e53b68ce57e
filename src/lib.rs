#[cfg(not(target_arch = "wasm32"))]
mod app;
pub mod camera;
pub mod config;
pub mod error;
mod event_dispatcher;
pub mod geometry;
pub mod graph_data;
pub mod index;
pub mod input;
mod quadtree;
pub mod renderer;
pub mod scene;
pub mod selection;

#[cfg(not(target_arch = "wasm32"))]
pub use app::{demo_graph, run};
pub use renderer::VizEngine;

/// Exports all the core types of the library.
pub mod prelude {
    pub use crate::config::{EngineOptions, EngineOptionsBuilder};
    pub use crate::error::EngineError;
    pub use crate::geometry::Rect;
    pub use crate::graph_data::{Edge, EdgeId, GraphError, GraphModel, GraphStore, Node, NodeId, Rgba};
    pub use crate::input::{InputAction, InputState};
    pub use crate::renderer::VizEngine;
    pub use crate::renderer::capabilities::Capabilities;
    pub use crate::renderer::events::RenderEvent;
    pub use crate::renderer::strategy::{Category, StrategyKind, StrategyRegistry};
    pub use crate::scene::Scene;
}
