//! Node records: every node is an outer ring record followed by an inner
//! fill record drawn on top of it.

use super::buffer::BufferError;
use super::counter::PartitionCounts;
use super::instances::{Palette, PartitionedInstances};
use super::vertex_buffer::{NodeInstance, QuadInstance};
use crate::graph_data::{Node, Rgba};
use crate::selection::SelectionState;

/// Share of the radius taken by the ring.
pub const BORDER_FRACTION: f32 = 0.16;
pub const RECORDS_PER_NODE: usize = NodeInstance::RECORDS_PER_ELEMENT as usize;

const RING_DARKEN: f32 = 0.6;

fn node_records(node: &Node, fill: Rgba, ring: Rgba) -> [NodeInstance; RECORDS_PER_NODE] {
    let position = node.position.to_array();
    [
        NodeInstance {
            position,
            radius: node.size,
            color: ring.to_f32_bits(),
        },
        NodeInstance {
            position,
            radius: node.size * (1.0 - BORDER_FRACTION),
            color: fill.to_f32_bits(),
        },
    ]
}

/// Rebuilds `out` from the visible nodes. Selected nodes (the picked node and
/// its neighbours) go to the selected partition.
pub fn build_node_instances<'a, I>(
    visible: I,
    selection: &SelectionState,
    palette: &Palette,
    out: &mut PartitionedInstances<NodeInstance>,
) -> Result<PartitionCounts, BufferError>
where
    I: Iterator<Item = &'a Node> + Clone,
{
    let reserve = visible.clone().count() * RECORDS_PER_NODE;

    let unselected = visible
        .clone()
        .filter(|node| !selection.is_node_selected(node.id))
        .flat_map(|node| {
            let color = palette.unselected(node.color);
            node_records(node, color, color.scale(RING_DARKEN))
        });
    let selected = visible
        .filter(|node| selection.is_node_selected(node.id))
        .flat_map(|node| {
            node_records(node, palette.selected(node.color), node.color.scale(RING_DARKEN))
        });

    let counts = out.fill(reserve, RECORDS_PER_NODE, unselected, selected)?;
    log::debug!(
        "Nodes: {} unselected, {} selected",
        counts.unselected,
        counts.selected
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::graph_data::{GraphModel, NodeId};
    use glam::Vec2;

    fn star(leaves: usize) -> (GraphModel, NodeId) {
        let mut graph = GraphModel::new();
        let hub = graph.add_node(Vec2::ZERO, 2.0, Rgba::new(200, 40, 40, 255));
        for i in 0..leaves {
            let leaf = graph.add_node(Vec2::new(i as f32 * 5.0, 10.0), 1.0, Rgba::BLACK);
            if i % 2 == 0 {
                graph.add_edge(hub, leaf, 1.0, Rgba::BLACK).unwrap();
            }
        }
        (graph, hub)
    }

    #[test]
    fn partitions_are_ordered_and_counted() {
        let (graph, hub) = star(6);
        let selection = SelectionState::for_node(&graph, hub, true);
        let palette = Palette::new(&EngineOptions::default(), &selection);
        let mut out = PartitionedInstances::default();

        let counts = build_node_instances(graph.nodes(), &selection, &palette, &mut out).unwrap();

        // hub plus three linked leaves selected (k = 4), three leaves not (n - k = 3)
        assert_eq!(counts, PartitionCounts { unselected: 3, selected: 4 });
        assert_eq!(out.unselected().len(), 3 * RECORDS_PER_NODE);
        assert_eq!(out.records().len(), 7 * RECORDS_PER_NODE);

        let positions = |records: &[NodeInstance]| -> Vec<[f32; 2]> {
            records.iter().step_by(RECORDS_PER_NODE).map(|r| r.position).collect()
        };
        assert!(positions(out.unselected()).iter().all(|p| p[1] == 10.0));
        assert_eq!(positions(out.selected())[0], [0.0, 0.0]);
    }

    #[test]
    fn inner_record_uses_the_border_fraction() {
        let (graph, _) = star(0);
        let selection = SelectionState::default();
        let palette = Palette::new(&EngineOptions::default(), &selection);
        let mut out = PartitionedInstances::default();
        build_node_instances(graph.nodes(), &selection, &palette, &mut out).unwrap();

        let [outer, inner] = out.records() else {
            panic!("expected two records");
        };
        assert_eq!(outer.radius, 2.0);
        assert!((inner.radius - 1.68).abs() < 1e-6);
        assert_eq!(Rgba::from_f32_bits(inner.color), Rgba::new(200, 40, 40, 255));
        assert_eq!(Rgba::from_f32_bits(outer.color), Rgba::new(120, 24, 24, 255));
    }

    #[test]
    fn selected_fill_is_brighter() {
        let (graph, hub) = star(2);
        let selection = SelectionState::for_node(&graph, hub, false);
        let palette = Palette::new(&EngineOptions::default(), &selection);
        let mut out = PartitionedInstances::default();
        build_node_instances(graph.nodes(), &selection, &palette, &mut out).unwrap();

        let fill = Rgba::from_f32_bits(out.selected()[1].color).channels();
        assert!(fill[1] > 40 && fill[2] > 40);
    }

    #[test]
    fn empty_visible_set_gives_empty_partitions() {
        let selection = SelectionState::default();
        let palette = Palette::new(&EngineOptions::default(), &selection);
        let mut out = PartitionedInstances::default();
        let counts =
            build_node_instances(std::iter::empty(), &selection, &palette, &mut out).unwrap();
        assert_eq!(counts, PartitionCounts::default());
    }
}
