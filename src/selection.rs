//! The current selection: one node, its incident edges and optionally its neighbours.
//!
//! A selection is always built whole and swapped in with [`SelectionState::replace`],
//! so a frame never sees an edge selected without its node.

use crate::graph_data::{EdgeId, GraphModel, NodeId};
use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    selected_node: Option<NodeId>,
    selected_edges: HashSet<EdgeId>,
    neighbours: HashSet<NodeId>,
}

impl SelectionState {
    /// Selection of `node`, its incident edges, and with `include_neighbours`
    /// the nodes at the other end of those edges.
    pub fn for_node(graph: &GraphModel, node: NodeId, include_neighbours: bool) -> Self {
        let mut selected_edges = HashSet::new();
        let mut neighbours = HashSet::new();

        for edge in graph.incident_edges(node) {
            selected_edges.insert(edge.id);
            let other = edge.opposite(node);
            if include_neighbours && other != node {
                neighbours.insert(other);
            }
        }

        Self {
            selected_node: Some(node),
            selected_edges,
            neighbours,
        }
    }

    pub fn replace(&mut self, next: Self) {
        *self = next;
    }

    pub fn clear(&mut self) {
        self.replace(Self::default());
    }

    pub fn is_empty(&self) -> bool {
        self.selected_node.is_none()
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected_node
    }

    pub fn selected_edges(&self) -> &HashSet<EdgeId> {
        &self.selected_edges
    }

    pub fn neighbours(&self) -> &HashSet<NodeId> {
        &self.neighbours
    }

    /// `true` for the selected node and its neighbours; these draw in the
    /// selected partition.
    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.selected_node == Some(id) || self.neighbours.contains(&id)
    }

    pub fn is_edge_selected(&self, id: EdgeId) -> bool {
        self.selected_edges.contains(&id)
    }
}
