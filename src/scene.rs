//! Camera, selection and graph index of one rendering target, and the input
//! actions that change them.

use crate::camera::Camera;
use crate::config::EngineOptions;
use crate::geometry::{Rect, ViewBoundaries};
use crate::graph_data::{GraphError, GraphModel, GraphStore, Node, NodeId};
use crate::index::{self, GraphIndex};
use crate::renderer::events::RenderEvent;
use crate::selection::SelectionState;
use glam::Vec2;
use std::sync::Arc;

pub struct Scene {
    index: GraphIndex,
    camera: Camera,
    selection: SelectionState,
    options: EngineOptions,
}

impl Scene {
    pub fn new(
        store: Arc<GraphStore>,
        options: EngineOptions,
        viewport: Vec2,
    ) -> Result<Self, GraphError> {
        let mut index = GraphIndex::new(store);
        index.index_edges()?;
        Ok(Self {
            index,
            camera: Camera::new(viewport.x, viewport.y, options.zoom_limits.clone()),
            selection: SelectionState::default(),
            options,
        })
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn view_boundaries(&self) -> ViewBoundaries {
        self.camera.view_boundaries()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.camera.resize(width, height);
    }

    /// Selects the topmost node under a world-space point, or clears the
    /// selection when there is none. Returns the selected node.
    pub fn select_at(&mut self, world: Vec2) -> Result<Option<NodeId>, GraphError> {
        let graph = self.index.store().read()?;
        let (picked, next) = pick(
            &graph,
            world,
            &self.selection,
            self.options.auto_select_neighbours,
        );
        drop(graph);
        self.selection.replace(next);
        Ok(picked)
    }

    pub fn select_at_screen(&mut self, screen: Vec2) -> Result<Option<NodeId>, GraphError> {
        self.select_at(self.camera.screen_to_world(screen))
    }

    /// Selects the first node overlapping `rect`, or clears the selection.
    pub fn select_in_rectangle(&mut self, rect: &Rect) -> Result<Option<NodeId>, GraphError> {
        self.select_first(|graph| index::nodes_inside_rectangle(graph, rect))
    }

    /// Selects the first node overlapping the circle, or clears the selection.
    pub fn select_in_circle(
        &mut self,
        center: Vec2,
        radius: f32,
    ) -> Result<Option<NodeId>, GraphError> {
        self.select_first(|graph| index::nodes_inside_circle(graph, center, radius))
    }

    fn select_first(
        &mut self,
        query: impl FnOnce(&GraphModel) -> Vec<Node>,
    ) -> Result<Option<NodeId>, GraphError> {
        let graph = self.index.store().read()?;
        let first = query(&graph).first().map(|n| n.id);
        let next = selection_for(&graph, first, self.options.auto_select_neighbours);
        drop(graph);
        self.selection.replace(next);
        Ok(first)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Pans by a screen-space delta; the distance moved in world space is
    /// the delta divided by the current zoom.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.camera.pan_by(screen_delta);
    }

    /// Zooms by `factor`, keeping the world point under the screen-space
    /// `anchor` in place.
    pub fn zoom(&mut self, factor: f32, anchor: Vec2) {
        self.camera.zoom_at(factor, anchor);
    }

    pub fn fit(&mut self) -> Result<(), GraphError> {
        let bounds = self.index.graph_boundaries()?;
        self.camera.fit(&bounds);
        Ok(())
    }

    /// Re-indexes edge weights and rebuilds the selection against the
    /// current graph, dropping it if the selected node is gone.
    pub fn graph_changed(&mut self) -> Result<(), GraphError> {
        self.index.index_edges()?;
        let Some(id) = self.selection.selected_node() else {
            return Ok(());
        };
        let next = {
            let graph = self.index.store().read()?;
            let alive = graph.node(id).map(|node| node.id);
            selection_for(&graph, alive, self.options.auto_select_neighbours)
        };
        self.selection.replace(next);
        Ok(())
    }

    pub fn apply(&mut self, event: RenderEvent) -> Result<(), GraphError> {
        match event {
            RenderEvent::Zoomed(factor) => {
                let center = self.camera.viewport() / 2.0;
                self.zoom(factor, center);
            }
            RenderEvent::Panned(delta) => self.pan(delta),
            RenderEvent::CenterGraph => self.fit()?,
            RenderEvent::SelectAt(screen) => {
                self.select_at_screen(screen)?;
            }
            RenderEvent::ClearSelection => self.clear_selection(),
            RenderEvent::GraphChanged => self.graph_changed()?,
        }
        Ok(())
    }
}

/// Picks the topmost node under `world` and builds its selection from the
/// same graph snapshot.
fn pick(
    graph: &GraphModel,
    world: Vec2,
    current: &SelectionState,
    include_neighbours: bool,
) -> (Option<NodeId>, SelectionState) {
    let picked = topmost(&index::nodes_under(graph, world), current);
    (picked, selection_for(graph, picked, include_neighbours))
}

fn selection_for(graph: &GraphModel, node: Option<NodeId>, include_neighbours: bool) -> SelectionState {
    match node {
        Some(id) => SelectionState::for_node(graph, id, include_neighbours),
        None => SelectionState::default(),
    }
}

/// The node drawn last among `candidates` (ascending id order): selected
/// nodes draw on the middle layer above everything else, then higher ids
/// draw over lower ones.
fn topmost(candidates: &[Node], selection: &SelectionState) -> Option<NodeId> {
    candidates
        .iter()
        .rev()
        .find(|node| selection.is_node_selected(node.id))
        .or_else(|| candidates.last())
        .map(|node| node.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_data::Rgba;

    fn scene(graph: GraphModel) -> Scene {
        Scene::new(
            Arc::new(GraphStore::new(graph)),
            EngineOptions::default(),
            Vec2::new(800.0, 600.0),
        )
        .unwrap()
    }

    #[test]
    fn picking_is_boundary_inclusive() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::new(5.0, 5.0), 2.0, Rgba::BLACK);
        let mut scene = scene(graph);

        assert_eq!(scene.select_at(Vec2::new(5.0, 5.0)).unwrap(), Some(a));
        assert_eq!(scene.select_at(Vec2::new(7.0, 5.0)).unwrap(), Some(a));
        assert_eq!(scene.select_at(Vec2::new(7.01, 5.0)).unwrap(), None);
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn overlapping_nodes_pick_the_topmost() {
        let mut graph = GraphModel::new();
        let low = graph.add_node(Vec2::ZERO, 3.0, Rgba::BLACK);
        let high = graph.add_node(Vec2::new(1.0, 0.0), 3.0, Rgba::BLACK);
        let far = graph.add_node(Vec2::new(10.0, 0.0), 1.0, Rgba::BLACK);
        graph.add_edge(low, far, 1.0, Rgba::BLACK).unwrap();
        let mut scene = scene(graph);

        assert_eq!(scene.select_at(Vec2::new(0.5, 0.0)).unwrap(), Some(high));

        // `low` becomes a selected neighbour and draws above `high`.
        scene.select_at(Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(scene.select_at(Vec2::new(0.5, 0.0)).unwrap(), Some(low));
    }

    #[test]
    fn shape_selection_takes_the_first_match() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
        graph.add_node(Vec2::new(3.0, 0.0), 1.0, Rgba::BLACK);
        let mut scene = scene(graph);

        let hit = scene.select_in_rectangle(&Rect::new(-5.0, -5.0, 5.0, 5.0)).unwrap();
        assert_eq!(hit, Some(a));
        let miss = scene.select_in_circle(Vec2::new(50.0, 50.0), 1.0).unwrap();
        assert_eq!(miss, None);
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn removed_selection_is_dropped_on_graph_change() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::ZERO, 1.0, Rgba::BLACK);
        let store = Arc::new(GraphStore::new(graph));
        let mut scene =
            Scene::new(store.clone(), EngineOptions::default(), Vec2::new(800.0, 600.0)).unwrap();
        scene.select_at(Vec2::ZERO).unwrap();

        store.write().unwrap().remove_node(a).unwrap();
        scene.apply(RenderEvent::GraphChanged).unwrap();
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn center_graph_fits_the_camera() {
        let mut graph = GraphModel::new();
        graph.add_node(Vec2::new(-100.0, 0.0), 10.0, Rgba::BLACK);
        graph.add_node(Vec2::new(100.0, 0.0), 10.0, Rgba::BLACK);
        let mut scene = scene(graph);
        scene.apply(RenderEvent::CenterGraph).unwrap();

        assert_eq!(scene.camera().pan(), Vec2::ZERO);
        // 0.9 * min(800 / 220, 600 / 20)
        assert!((scene.camera().zoom() - 0.9 * 800.0 / 220.0).abs() < 1e-4);
    }

    #[test]
    fn picking_reads_one_graph_snapshot() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(Vec2::ZERO, 2.0, Rgba::BLACK);
        let b = graph.add_node(Vec2::new(10.0, 0.0), 1.0, Rgba::BLACK);
        let ab = graph.add_edge(a, b, 1.0, Rgba::BLACK).unwrap();

        let (picked, selection) = pick(&graph, Vec2::ZERO, &SelectionState::default(), true);
        assert_eq!(picked, Some(a));
        assert!(selection.is_edge_selected(ab));
        assert!(selection.neighbours().contains(&b));

        graph.remove_node(a).unwrap();
        let (picked, selection) = pick(&graph, Vec2::ZERO, &SelectionState::default(), true);
        assert_eq!(picked, None);
        assert!(selection.is_empty());
    }
}
