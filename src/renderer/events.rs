//! Event channels for communicating with the renderer from the outside.

use glam::Vec2;

/// Describes an event received by a [`crate::VizEngine`].
///
/// Events are queued and applied at the start of the next frame.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderEvent {
    /// Zoom the graph around the viewport center.
    /// Values above one zoom in, below one zoom out.
    Zoomed(f32),

    /// Pan by a screen-space delta in pixels.
    Panned(Vec2),

    /// Zoom to show all nodes.
    CenterGraph,

    /// Select the topmost node under a screen-space position.
    SelectAt(Vec2),

    ClearSelection,

    /// The host changed the graph; edge weights are re-indexed.
    GraphChanged,
}
