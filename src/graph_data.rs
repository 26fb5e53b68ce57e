//! In-memory graph store.
//!
//! The engine only ever reads the graph through [`GraphStore::read`], holding
//! the returned guard for the duration of a single query. Hosts mutate it
//! through [`GraphStore::write`] from any thread.

use crate::geometry::Rect;
use crate::quadtree::QuadTree;
use glam::Vec2;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Default extent of the spatial structure. Elements outside still work,
/// they are just scanned linearly.
const WORLD_EXTENT: f32 = 65_536.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph lock poisoned by a panicking writer")]
    LockPoisoned,
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("unknown edge {0:?}")]
    UnknownEdge(EdgeId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Packed RGBA color, red in the lowest byte.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba(pub u32);

impl Rgba {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_le_bytes([r, g, b, a]))
    }

    pub const fn channels(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// The packed bits reinterpreted as a float, for transport through a
    /// float vertex attribute. The shader reverses this with a bitcast.
    pub fn to_f32_bits(self) -> f32 {
        f32::from_bits(self.0)
    }

    pub fn from_f32_bits(value: f32) -> Self {
        Self(value.to_bits())
    }

    pub fn to_unorm(self) -> [f32; 4] {
        self.channels().map(|c| f32::from(c) / 255.0)
    }

    /// Scales the color channels, keeping alpha.
    pub fn scale(self, factor: f32) -> Self {
        let [r, g, b, a] = self.channels();
        let s = |c: u8| (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(s(r), s(g), s(b), a)
    }

    /// Linear blend toward `other`; `t = 0` keeps `self`.
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let [r0, g0, b0, a0] = self.channels();
        let [r1, g1, b1, _] = other.channels();
        let m = |c0: u8, c1: u8| {
            (f32::from(c0) + (f32::from(c1) - f32::from(c0)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::new(m(r0, r1), m(g0, g1), m(b0, b1), a0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec2,
    /// Radius in world units.
    pub size: f32,
    pub color: Rgba,
}

impl Node {
    pub fn bounds(&self) -> Rect {
        Rect::around(self.position, self.size)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
    pub color: Rgba,
}

impl Edge {
    /// The endpoint opposite to `node`.
    pub fn opposite(&self, node: NodeId) -> NodeId {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Ordered float key for the weight column.
#[derive(Copy, Clone, Debug)]
struct WeightKey(f32);

impl PartialEq for WeightKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WeightKey {}

impl PartialOrd for WeightKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Sorted multiset of edge weights, giving min/max without a scan.
#[derive(Default)]
struct WeightColumn {
    weights: BTreeMap<WeightKey, usize>,
}

impl WeightColumn {
    fn add(&mut self, weight: f32) {
        *self.weights.entry(WeightKey(weight)).or_insert(0) += 1;
    }

    fn remove(&mut self, weight: f32) {
        let key = WeightKey(weight);
        if let Some(count) = self.weights.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.weights.remove(&key);
            }
        }
    }

    fn range(&self) -> Option<(f32, f32)> {
        let (min, _) = self.weights.first_key_value()?;
        let (max, _) = self.weights.last_key_value()?;
        Some((min.0, max.0))
    }
}

pub struct GraphModel {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    incident: Vec<Vec<EdgeId>>,
    node_tree: QuadTree<NodeId>,
    edge_tree: QuadTree<EdgeId>,
    weight_column: Option<WeightColumn>,
    node_count: usize,
    edge_count: usize,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel {
    pub fn new() -> Self {
        let world = Rect::new(-WORLD_EXTENT, -WORLD_EXTENT, WORLD_EXTENT, WORLD_EXTENT);
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            incident: Vec::new(),
            node_tree: QuadTree::new(world),
            edge_tree: QuadTree::new(world),
            weight_column: None,
            node_count: 0,
            edge_count: 0,
        }
    }

    /// Same as [`GraphModel::new`] but maintains an edge-weight column index.
    pub fn with_weight_index() -> Self {
        Self {
            weight_column: Some(WeightColumn::default()),
            ..Self::new()
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn add_node(&mut self, position: Vec2, size: f32, color: Rgba) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let node = Node {
            id,
            position,
            size,
            color,
        };
        self.node_tree.insert(id, node.bounds());
        self.nodes.push(Some(node));
        self.incident.push(Vec::new());
        self.node_count += 1;
        id
    }

    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: f32,
        color: Rgba,
    ) -> Result<EdgeId, GraphError> {
        let (a, b) = (self.node_ref(source)?, self.node_ref(target)?);
        let bbox = Rect::from_corners(a.position, b.position);

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge {
            id,
            source,
            target,
            weight,
            color,
        }));
        self.edge_tree.insert(id, bbox);
        self.incident[source.0 as usize].push(id);
        if source != target {
            self.incident[target.0 as usize].push(id);
        }
        if let Some(column) = self.weight_column.as_mut() {
            column.add(weight);
        }
        self.edge_count += 1;
        Ok(id)
    }

    /// Moves a node, keeping the spatial structure of the node and its edges current.
    pub fn set_node_position(&mut self, id: NodeId, position: Vec2) -> Result<(), GraphError> {
        let old = *self.node_ref(id)?;
        self.node_tree.remove(id, &old.bounds());

        let incident = self.incident[id.0 as usize].clone();
        for edge_id in &incident {
            if let Some(bbox) = self.edge_bounds(*edge_id) {
                self.edge_tree.remove(*edge_id, &bbox);
            }
        }

        let moved = Node { position, ..old };
        self.nodes[id.0 as usize] = Some(moved);
        self.node_tree.insert(id, moved.bounds());

        for edge_id in incident {
            if let Some(bbox) = self.edge_bounds(edge_id) {
                self.edge_tree.insert(edge_id, bbox);
            }
        }
        Ok(())
    }

    pub fn set_node_color(&mut self, id: NodeId, color: Rgba) -> Result<(), GraphError> {
        let slot = self
            .nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownNode(id))?;
        slot.color = color;
        Ok(())
    }

    pub fn set_edge_weight(&mut self, id: EdgeId, weight: f32) -> Result<(), GraphError> {
        let slot = self
            .edges
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownEdge(id))?;
        if let Some(column) = self.weight_column.as_mut() {
            column.remove(slot.weight);
            column.add(weight);
        }
        slot.weight = weight;
        Ok(())
    }

    /// Removes a node together with its incident edges.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = *self.node_ref(id)?;
        for edge_id in self.incident[id.0 as usize].clone() {
            self.remove_edge(edge_id)?;
        }
        self.node_tree.remove(id, &node.bounds());
        self.nodes[id.0 as usize] = None;
        self.node_count -= 1;
        Ok(node)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GraphError> {
        let edge = *self.edge(id).ok_or(GraphError::UnknownEdge(id))?;
        if let Some(bbox) = self.edge_bounds(id) {
            self.edge_tree.remove(id, &bbox);
        }
        for end in [edge.source, edge.target] {
            self.incident[end.0 as usize].retain(|e| *e != id);
        }
        if let Some(column) = self.weight_column.as_mut() {
            column.remove(edge.weight);
        }
        self.edges[id.0 as usize] = None;
        self.edge_count -= 1;
        Ok(edge)
    }

    pub fn clear(&mut self) {
        let indexed = self.weight_column.is_some();
        *self = if indexed {
            Self::with_weight_index()
        } else {
            Self::new()
        };
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize)?.as_ref()
    }

    fn node_ref(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.node(id).ok_or(GraphError::UnknownNode(id))
    }

    fn edge_bounds(&self, id: EdgeId) -> Option<Rect> {
        let edge = self.edge(id)?;
        let (a, b) = (self.node(edge.source)?, self.node(edge.target)?);
        Some(Rect::from_corners(a.position, b.position))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + Clone {
        self.nodes.iter().flatten()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + Clone {
        self.edges.iter().flatten()
    }

    /// Edges attached to `id`, in insertion order.
    pub fn incident_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.incident
            .get(id.0 as usize)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edge(*edge_id))
    }

    /// Ids of nodes whose bounds intersect `area`, in ascending id order.
    pub fn nodes_intersecting(&self, area: &Rect) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.node_tree.query(area, &mut ids);
        ids.sort_unstable();
        ids
    }

    /// Ids of edges whose segment bounds intersect `area`, in ascending id order.
    pub fn edges_intersecting(&self, area: &Rect) -> Vec<EdgeId> {
        let mut ids = Vec::new();
        self.edge_tree.query(area, &mut ids);
        ids.sort_unstable();
        ids
    }

    /// Min/max edge weight from the column index, `None` when the graph
    /// is not indexed or has no edges.
    pub fn indexed_weight_range(&self) -> Option<(f32, f32)> {
        self.weight_column.as_ref()?.range()
    }

    pub fn has_weight_index(&self) -> bool {
        self.weight_column.is_some()
    }
}

/// Lock-protected graph shared between the host and the engine.
#[derive(Default)]
pub struct GraphStore {
    inner: RwLock<GraphModel>,
}

impl GraphStore {
    pub fn new(model: GraphModel) -> Self {
        Self {
            inner: RwLock::new(model),
        }
    }

    /// Acquires the read lock. The lock is released when the guard drops.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, GraphModel>, GraphError> {
        self.inner.read().map_err(|_| GraphError::LockPoisoned)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, GraphModel>, GraphError> {
        self.inner.write().map_err(|_| GraphError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bits_survive_float_transport() {
        // NaN payloads and denormals must keep their exact bit pattern.
        for bits in [0xFFFF_FFFF, 0x7FC0_0001, 0x0000_0001, 0x80FF_00FF] {
            let color = Rgba(bits);
            assert_eq!(Rgba::from_f32_bits(color.to_f32_bits()), color);
            assert_eq!(bytemuck::cast::<f32, u32>(color.to_f32_bits()), bits);
        }
    }

    #[test]
    fn rgba_channel_order() {
        let c = Rgba::new(1, 2, 3, 4);
        assert_eq!(c.channels(), [1, 2, 3, 4]);
        assert_eq!(c.0 & 0xFF, 1);
    }

    #[test]
    fn unorm_is_a_plain_division() {
        assert_eq!(Rgba::new(0, 51, 255, 102).to_unorm(), [0.0, 0.2, 1.0, 0.4]);
    }

    #[test]
    fn mix_keeps_alpha() {
        let c = Rgba::new(0, 0, 0, 128).mix(Rgba::WHITE, 0.5);
        assert_eq!(c.channels(), [128, 128, 128, 128]);
    }

    #[test]
    fn moving_a_node_moves_its_edges() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
        let b = graph.add_node(Vec2::new(10.0, 0.0), 1.0, Rgba::BLACK);
        let e = graph.add_edge(a, b, 1.0, Rgba::BLACK).unwrap();

        let far = Rect::new(95.0, 95.0, 105.0, 105.0);
        assert!(graph.edges_intersecting(&far).is_empty());

        graph.set_node_position(b, Vec2::new(100.0, 100.0)).unwrap();
        assert_eq!(graph.edges_intersecting(&far), vec![e]);
        assert_eq!(graph.nodes_intersecting(&far), vec![b]);
    }

    #[test]
    fn weight_column_tracks_updates_and_removals() {
        let mut graph = GraphModel::with_weight_index();
        let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
        let b = graph.add_node(Vec2::ONE, 1.0, Rgba::BLACK);
        let e1 = graph.add_edge(a, b, 2.0, Rgba::BLACK).unwrap();
        graph.add_edge(b, a, 5.0, Rgba::BLACK).unwrap();
        assert_eq!(graph.indexed_weight_range(), Some((2.0, 5.0)));

        graph.set_edge_weight(e1, 9.0).unwrap();
        assert_eq!(graph.indexed_weight_range(), Some((5.0, 9.0)));

        graph.remove_node(a).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.indexed_weight_range(), None);
    }

    #[test]
    fn edge_to_missing_node_is_rejected() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
        assert_eq!(
            graph.add_edge(a, NodeId(42), 1.0, Rgba::BLACK),
            Err(GraphError::UnknownNode(NodeId(42)))
        );
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let store = std::sync::Arc::new(GraphStore::default());
        let writer = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = writer.write().unwrap();
            panic!("writer died");
        })
        .join();
        assert_eq!(store.read().err(), Some(GraphError::LockPoisoned));
    }
}
