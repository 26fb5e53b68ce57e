//! Edge records: one line quad per visible edge.

use super::buffer::BufferError;
use super::counter::PartitionCounts;
use super::instances::{Palette, PartitionedInstances};
use super::vertex_buffer::EdgeInstance;
use crate::config::EngineOptions;
use crate::graph_data::Rgba;
use crate::index::EdgeView;
use crate::selection::SelectionState;

/// Maps edge weights onto line widths.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeWidths {
    weight_range: (f32, f32),
    min_width: f32,
    max_width: f32,
    scale: f32,
}

impl EdgeWidths {
    pub fn new(options: &EngineOptions, weight_range: (f32, f32)) -> Self {
        Self {
            weight_range,
            min_width: options.edge_min_width,
            max_width: options.edge_max_width,
            scale: options.edge_scale,
        }
    }

    /// Linear in the weight; every edge gets the middle width when all
    /// weights are equal.
    pub fn width(&self, weight: f32) -> f32 {
        let (min, max) = self.weight_range;
        let t = if max - min > f32::EPSILON {
            ((weight - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        (self.min_width + (self.max_width - self.min_width) * t) * self.scale
    }
}

/// What is emitted for the current frame.
#[derive(Copy, Clone, Debug)]
pub struct EdgeFilter {
    pub show_edges: bool,
    /// Drop unselected edges while a selection is active.
    pub hide_non_selected: bool,
}

impl From<&EngineOptions> for EdgeFilter {
    fn from(options: &EngineOptions) -> Self {
        Self {
            show_edges: options.show_edges,
            hide_non_selected: options.hide_non_selected_edges,
        }
    }
}

fn edge_record(view: &EdgeView<'_>, widths: &EdgeWidths, color: Rgba) -> EdgeInstance {
    EdgeInstance {
        source: view.source.position.to_array(),
        target: view.target.position.to_array(),
        width: widths.width(view.edge.weight),
        color: color.to_f32_bits(),
    }
}

pub fn build_edge_instances<'a, I>(
    visible: I,
    selection: &SelectionState,
    palette: &Palette,
    widths: &EdgeWidths,
    filter: EdgeFilter,
    out: &mut PartitionedInstances<EdgeInstance>,
) -> Result<PartitionCounts, BufferError>
where
    I: Iterator<Item = EdgeView<'a>> + Clone,
{
    if !filter.show_edges {
        return out.fill(0, 1, std::iter::empty(), std::iter::empty());
    }
    let skip_unselected = filter.hide_non_selected && palette.selection_active();
    let reserve = if skip_unselected {
        selection.selected_edges().len()
    } else {
        visible.clone().count()
    };

    let unselected = visible
        .clone()
        .filter(|view| !skip_unselected && !selection.is_edge_selected(view.edge.id))
        .map(|view| edge_record(&view, widths, palette.unselected(view.edge.color)));
    let selected = visible
        .filter(|view| selection.is_edge_selected(view.edge.id))
        .map(|view| edge_record(&view, widths, palette.selected(view.edge.color)));

    let counts = out.fill(reserve, 1, unselected, selected)?;
    log::debug!(
        "Edges: {} unselected, {} selected",
        counts.unselected,
        counts.selected
    );
    Ok(counts)
}
