//! Spatial queries over the shared graph.
//!
//! Every query takes the store's read lock for its whole duration. The
//! visible-set queries hand the guard to the returned [`VisibleNodes`] /
//! [`VisibleEdges`] so that the sequence can be walked several times
//! without re-querying; the lock is released when they drop.

use crate::geometry::{self, Rect, ViewBoundaries};
use crate::graph_data::{Edge, EdgeId, GraphError, GraphModel, GraphStore, Node, NodeId};
use glam::Vec2;
use std::sync::{Arc, RwLockReadGuard};

/// Visible nodes of one frame, in ascending id order.
pub struct VisibleNodes<'a> {
    graph: RwLockReadGuard<'a, GraphModel>,
    ids: Vec<NodeId>,
}

impl VisibleNodes<'_> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Restartable: every call yields the same sequence.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + Clone + '_ {
        self.ids.iter().filter_map(|id| self.graph.node(*id))
    }
}

/// An edge together with its resolved endpoints.
#[derive(Copy, Clone, Debug)]
pub struct EdgeView<'a> {
    pub edge: &'a Edge,
    pub source: &'a Node,
    pub target: &'a Node,
}

/// Visible edges of one frame, in ascending id order.
pub struct VisibleEdges<'a> {
    graph: RwLockReadGuard<'a, GraphModel>,
    ids: Vec<EdgeId>,
}

impl VisibleEdges<'_> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeView<'_>> + Clone + '_ {
        self.ids
            .iter()
            .filter_map(|id| resolve_edge(&self.graph, *id))
    }
}

fn resolve_edge(graph: &GraphModel, id: EdgeId) -> Option<EdgeView<'_>> {
    let edge = graph.edge(id)?;
    Some(EdgeView {
        edge,
        source: graph.node(edge.source)?,
        target: graph.node(edge.target)?,
    })
}

/// Node queries against an already locked graph, for callers that must
/// read more than one thing under the same guard.
pub fn nodes_under(graph: &GraphModel, point: Vec2) -> Vec<Node> {
    graph
        .nodes_intersecting(&Rect::point(point))
        .into_iter()
        .filter_map(|id| graph.node(id))
        .filter(|node| geometry::circle_contains_point(node.position, node.size, point))
        .copied()
        .collect()
}

pub fn nodes_inside_circle(graph: &GraphModel, center: Vec2, radius: f32) -> Vec<Node> {
    graph
        .nodes_intersecting(&Rect::around(center, radius))
        .into_iter()
        .filter_map(|id| graph.node(id))
        .filter(|node| geometry::circle_intersects_circle(node.position, node.size, center, radius))
        .copied()
        .collect()
}

pub fn nodes_inside_rectangle(graph: &GraphModel, rect: &Rect) -> Vec<Node> {
    graph
        .nodes_intersecting(rect)
        .into_iter()
        .filter_map(|id| graph.node(id))
        .filter(|node| geometry::rect_intersects_circle(rect, node.position, node.size))
        .copied()
        .collect()
}

pub struct GraphIndex {
    store: Arc<GraphStore>,
    edge_weights: (f32, f32),
}

impl GraphIndex {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store,
            edge_weights: (0.0, 0.0),
        }
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn visible_nodes(&self, view: &ViewBoundaries) -> Result<VisibleNodes<'_>, GraphError> {
        let graph = self.store.read()?;
        let ids = graph.nodes_intersecting(view);
        Ok(VisibleNodes { graph, ids })
    }

    pub fn visible_edges(&self, view: &ViewBoundaries) -> Result<VisibleEdges<'_>, GraphError> {
        let graph = self.store.read()?;
        let ids = graph.edges_intersecting(view);
        Ok(VisibleEdges { graph, ids })
    }

    /// All nodes whose circle contains `point` (boundary inclusive), in
    /// ascending id order, which is also their draw order.
    pub fn nodes_under(&self, point: Vec2) -> Result<Vec<Node>, GraphError> {
        let graph = self.store.read()?;
        Ok(nodes_under(&graph, point))
    }

    /// The topmost node under `point`: the last one drawn.
    pub fn node_under(&self, point: Vec2) -> Result<Option<Node>, GraphError> {
        Ok(self.nodes_under(point)?.pop())
    }

    pub fn nodes_inside_circle(&self, center: Vec2, radius: f32) -> Result<Vec<Node>, GraphError> {
        let graph = self.store.read()?;
        Ok(nodes_inside_circle(&graph, center, radius))
    }

    pub fn nodes_inside_rectangle(&self, rect: &Rect) -> Result<Vec<Node>, GraphError> {
        let graph = self.store.read()?;
        Ok(nodes_inside_rectangle(&graph, rect))
    }

    /// Edges whose center line touches the circle. Edge thickness is ignored.
    pub fn edges_inside_circle(&self, center: Vec2, radius: f32) -> Result<Vec<Edge>, GraphError> {
        let graph = self.store.read()?;
        Ok(graph
            .edges_intersecting(&Rect::around(center, radius))
            .into_iter()
            .filter_map(|id| resolve_edge(&graph, id))
            .filter(|view| {
                geometry::segment_intersects_circle(
                    view.source.position,
                    view.target.position,
                    center,
                    radius,
                )
            })
            .map(|view| *view.edge)
            .collect())
    }

    /// Edges whose center line crosses the rectangle. Edge thickness is ignored.
    pub fn edges_inside_rectangle(&self, rect: &Rect) -> Result<Vec<Edge>, GraphError> {
        let graph = self.store.read()?;
        Ok(graph
            .edges_intersecting(rect)
            .into_iter()
            .filter_map(|id| resolve_edge(&graph, id))
            .filter(|view| {
                geometry::rect_intersects_segment(rect, view.source.position, view.target.position)
            })
            .map(|view| *view.edge)
            .collect())
    }

    /// Smallest rectangle covering every node's circle; [`Rect::ZERO`] for an empty graph.
    pub fn graph_boundaries(&self) -> Result<Rect, GraphError> {
        let graph = self.store.read()?;
        Ok(graph
            .nodes()
            .map(Node::bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
            .unwrap_or(Rect::ZERO))
    }

    /// Recomputes the cached edge-weight range. Call whenever the graph's
    /// edges change.
    pub fn index_edges(&mut self) -> Result<(), GraphError> {
        let graph = self.store.read()?;
        let range = if graph.has_weight_index() {
            graph.indexed_weight_range()
        } else {
            graph.edges().map(|edge| edge.weight).fold(None, |acc, w| match acc {
                None => Some((w, w)),
                Some((min, max)) => Some((f32::min(min, w), f32::max(max, w))),
            })
        };
        self.edge_weights = range.unwrap_or((0.0, 0.0));
        log::debug!(
            "Indexed edge weights: min={} max={}",
            self.edge_weights.0,
            self.edge_weights.1
        );
        Ok(())
    }

    pub fn edge_weight_range(&self) -> (f32, f32) {
        self.edge_weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_data::Rgba;

    fn line_graph() -> (Arc<GraphStore>, [NodeId; 3]) {
        let mut graph = GraphModel::new();
        let ids = [0.0, 10.0, 20.0].map(|x| graph.add_node(Vec2::new(x, 0.0), 1.0, Rgba::BLACK));
        (Arc::new(GraphStore::new(graph)), ids)
    }

    #[test]
    fn visible_nodes_are_restartable() {
        let (store, [a, b, _]) = line_graph();
        let index = GraphIndex::new(store);
        let visible = index.visible_nodes(&Rect::new(-1.0, -1.0, 11.0, 1.0)).unwrap();

        let first: Vec<NodeId> = visible.iter().map(|n| n.id).collect();
        let second: Vec<NodeId> = visible.iter().map(|n| n.id).collect();
        assert_eq!(first, vec![a, b]);
        assert_eq!(first, second);
    }

    #[test]
    fn lock_is_released_after_queries() {
        let (store, _) = line_graph();
        let index = GraphIndex::new(Arc::clone(&store));
        {
            let _visible = index.visible_nodes(&Rect::new(-1.0, -1.0, 1.0, 1.0)).unwrap();
        }
        index.node_under(Vec2::ZERO).unwrap();
        assert!(store.write().is_ok());
    }

    #[test]
    fn picking_boundary_and_miss() {
        let (store, [a, _, _]) = line_graph();
        let index = GraphIndex::new(store);

        assert_eq!(index.node_under(Vec2::ZERO).unwrap().map(|n| n.id), Some(a));
        assert_eq!(
            index.node_under(Vec2::new(1.0, 0.0)).unwrap().map(|n| n.id),
            Some(a)
        );
        assert!(index.node_under(Vec2::new(1.0, 0.01)).unwrap().is_none());
        assert!(index.node_under(Vec2::new(5.0, 0.0)).unwrap().is_none());
    }

    #[test]
    fn overlapping_nodes_pick_the_last_drawn() {
        let mut graph = GraphModel::new();
        graph.add_node(Vec2::ZERO, 2.0, Rgba::BLACK);
        let top = graph.add_node(Vec2::new(0.5, 0.0), 2.0, Rgba::BLACK);
        let index = GraphIndex::new(Arc::new(GraphStore::new(graph)));

        assert_eq!(index.nodes_under(Vec2::ZERO).unwrap().len(), 2);
        assert_eq!(index.node_under(Vec2::ZERO).unwrap().map(|n| n.id), Some(top));
    }

    #[test]
    fn shape_queries() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
        let b = graph.add_node(Vec2::new(10.0, 0.0), 1.0, Rgba::BLACK);
        let c = graph.add_node(Vec2::new(10.0, 10.0), 1.0, Rgba::BLACK);
        let ab = graph.add_edge(a, b, 1.0, Rgba::BLACK).unwrap();
        let bc = graph.add_edge(b, c, 3.0, Rgba::BLACK).unwrap();
        let index = GraphIndex::new(Arc::new(GraphStore::new(graph)));

        let ids = |nodes: Vec<Node>| nodes.into_iter().map(|n| n.id).collect::<Vec<_>>();
        assert_eq!(ids(index.nodes_inside_circle(Vec2::new(5.0, 0.0), 4.0).unwrap()), vec![a, b]);
        assert_eq!(ids(index.nodes_inside_circle(Vec2::new(5.0, 0.0), 3.9).unwrap()), vec![]);
        assert_eq!(
            ids(index.nodes_inside_rectangle(&Rect::new(9.5, 5.0, 12.0, 9.5)).unwrap()),
            vec![c]
        );

        let edge_ids = |edges: Vec<Edge>| edges.into_iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(edge_ids(index.edges_inside_circle(Vec2::new(5.0, 1.0), 1.0).unwrap()), vec![ab]);
        assert_eq!(
            edge_ids(index.edges_inside_rectangle(&Rect::new(8.0, 4.0, 12.0, 6.0)).unwrap()),
            vec![bc]
        );
    }

    #[test]
    fn boundaries_cover_node_extents() {
        let (store, _) = line_graph();
        let index = GraphIndex::new(store);
        assert_eq!(index.graph_boundaries().unwrap(), Rect::new(-1.0, -1.0, 21.0, 1.0));

        let empty = GraphIndex::new(Arc::new(GraphStore::default()));
        assert_eq!(empty.graph_boundaries().unwrap(), Rect::ZERO);
    }

    #[test]
    fn edge_weights_with_and_without_column_index() {
        for mut graph in [GraphModel::new(), GraphModel::with_weight_index()] {
            let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
            let b = graph.add_node(Vec2::ONE, 1.0, Rgba::BLACK);
            graph.add_edge(a, b, 0.5, Rgba::BLACK).unwrap();
            graph.add_edge(a, b, 7.0, Rgba::BLACK).unwrap();

            let mut index = GraphIndex::new(Arc::new(GraphStore::new(graph)));
            assert_eq!(index.edge_weight_range(), (0.0, 0.0));
            index.index_edges().unwrap();
            assert_eq!(index.edge_weight_range(), (0.5, 7.0));
        }
    }
}
