//! Engine options.

use crate::graph_data::Rgba;
use std::ops::RangeInclusive;

/// Smallest zoom the builder accepts.
const MIN_ZOOM: f32 = 1e-6;

/// Options recognized by the engine. Diagnostic switches force the matching
/// drawing strategy to report itself unavailable.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    pub disable_instanced_drawing: bool,
    pub disable_indirect_drawing: bool,
    pub disable_vertex_arrays: bool,
    /// Request a validating GPU context.
    pub debug_context: bool,

    pub auto_select_neighbours: bool,
    pub show_edges: bool,
    pub hide_non_selected_edges: bool,
    pub lighten_non_selected: bool,
    /// How far unselected elements are pulled toward the background while a
    /// selection is active.
    pub lighten_factor: f32,
    pub background_color: Rgba,
    pub edge_scale: f32,
    pub edge_min_width: f32,
    pub edge_max_width: f32,
    pub zoom_limits: RangeInclusive<f32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            disable_instanced_drawing: false,
            disable_indirect_drawing: false,
            disable_vertex_arrays: false,
            debug_context: false,
            auto_select_neighbours: true,
            show_edges: true,
            hide_non_selected_edges: false,
            lighten_non_selected: true,
            lighten_factor: 0.7,
            background_color: Rgba::WHITE,
            edge_scale: 1.0,
            edge_min_width: 0.5,
            edge_max_width: 4.0,
            zoom_limits: 0.01..=100.0,
        }
    }
}

impl EngineOptions {
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }

    /// Mix factor toward the background for unselected elements, if any.
    pub fn unselected_fade(&self) -> Option<f32> {
        self.lighten_non_selected.then_some(self.lighten_factor)
    }
}

/// Builder for `EngineOptions`
#[derive(Default)]
pub struct EngineOptionsBuilder {
    options: EngineOptions,
}

impl EngineOptionsBuilder {
    pub fn disable_instanced_drawing(mut self, disable: bool) -> Self {
        self.options.disable_instanced_drawing = disable;
        self
    }

    pub fn disable_indirect_drawing(mut self, disable: bool) -> Self {
        self.options.disable_indirect_drawing = disable;
        self
    }

    pub fn disable_vertex_arrays(mut self, disable: bool) -> Self {
        self.options.disable_vertex_arrays = disable;
        self
    }

    pub fn debug_context(mut self, debug: bool) -> Self {
        self.options.debug_context = debug;
        self
    }

    pub fn auto_select_neighbours(mut self, enabled: bool) -> Self {
        self.options.auto_select_neighbours = enabled;
        self
    }

    pub fn show_edges(mut self, show: bool) -> Self {
        self.options.show_edges = show;
        self
    }

    pub fn hide_non_selected_edges(mut self, hide: bool) -> Self {
        self.options.hide_non_selected_edges = hide;
        self
    }

    /// Pull unselected elements toward the background by `factor` while a
    /// selection is active. `None` disables lightening.
    ///
    /// `factor` is clamped to `0.0..=1.0`.
    pub fn lighten_non_selected(mut self, factor: Option<f32>) -> Self {
        self.options.lighten_non_selected = factor.is_some();
        if let Some(factor) = factor {
            self.options.lighten_factor = factor.clamp(0.0, 1.0);
        }
        self
    }

    pub fn background_color(mut self, color: Rgba) -> Self {
        self.options.background_color = color;
        self
    }

    pub fn edge_scale(mut self, scale: f32) -> Self {
        self.options.edge_scale = scale;
        self
    }

    /// World-space width range that edge weights are mapped onto.
    pub fn edge_width_range(mut self, min: f32, max: f32) -> Self {
        self.options.edge_min_width = min.min(max);
        self.options.edge_max_width = max.max(min);
        self
    }

    /// Allowed zoom range. The bounds are swapped if given in the wrong
    /// order, and the lower one is kept above zero.
    pub fn zoom_limits(mut self, min: f32, max: f32) -> Self {
        let low = min.min(max).max(MIN_ZOOM);
        let high = max.max(min).max(low);
        self.options.zoom_limits = low..=high;
        self
    }

    pub fn build(self) -> EngineOptions {
        self.options
    }
}
