use crate::graph_data::GraphError;
use crate::renderer::buffer::BufferError;
use thiserror::Error;

/// Failures that reach the frame driver. The driver may skip the frame or stop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("renderer used before its GPU resources were created")]
    NotInitialized,
}
