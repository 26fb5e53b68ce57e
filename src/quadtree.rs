//! Region quadtree over axis-aligned bounding boxes.
//!
//! Items live in the deepest quad that fully contains their bounding box.
//! Items outside the root boundary are kept in an overflow list that every
//! query scans, so the tree never rejects an insert.

use crate::geometry::Rect;

const MAX_ITEMS: usize = 16;
const MAX_DEPTH: u8 = 12;

struct Quad<K> {
    boundary: Rect,
    depth: u8,
    items: Vec<(K, Rect)>,
    children: Option<Box<[Quad<K>; 4]>>,
}

impl<K: Copy + PartialEq> Quad<K> {
    fn new(boundary: Rect, depth: u8) -> Self {
        Self {
            boundary,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn child_for(&mut self, bbox: &Rect) -> Option<&mut Quad<K>> {
        self.children
            .as_deref_mut()?
            .iter_mut()
            .find(|child| child.boundary.contains_rect(bbox))
    }

    fn insert(&mut self, key: K, bbox: Rect) {
        if let Some(child) = self.child_for(&bbox) {
            child.insert(key, bbox);
            return;
        }

        self.items.push((key, bbox));

        if self.children.is_none() && self.items.len() > MAX_ITEMS && self.depth < MAX_DEPTH {
            self.split();
        }
    }

    fn split(&mut self) {
        let [nw, ne, sw, se] = self.boundary.quadrants();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            Quad::new(nw, depth),
            Quad::new(ne, depth),
            Quad::new(sw, depth),
            Quad::new(se, depth),
        ]));

        let items = std::mem::take(&mut self.items);
        for (key, bbox) in items {
            self.insert(key, bbox);
        }
    }

    fn remove(&mut self, key: K, bbox: &Rect) -> bool {
        if let Some(child) = self.child_for(bbox)
            && child.remove(key, bbox)
        {
            return true;
        }

        match self.items.iter().position(|(k, _)| *k == key) {
            Some(i) => {
                self.items.swap_remove(i);
                true
            }
            None => false,
        }
    }

    fn query(&self, area: &Rect, out: &mut Vec<K>) {
        if !self.boundary.intersects(area) {
            return;
        }

        out.extend(
            self.items
                .iter()
                .filter(|(_, bbox)| bbox.intersects(area))
                .map(|(key, _)| *key),
        );

        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.query(area, out);
            }
        }
    }
}

pub struct QuadTree<K> {
    root: Quad<K>,
    overflow: Vec<(K, Rect)>,
}

impl<K: Copy + PartialEq> QuadTree<K> {
    pub fn new(boundary: Rect) -> Self {
        Self {
            root: Quad::new(boundary, 0),
            overflow: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: K, bbox: Rect) {
        if self.root.boundary.contains_rect(&bbox) {
            self.root.insert(key, bbox);
        } else {
            self.overflow.push((key, bbox));
        }
    }

    /// Removes `key`, which must have been inserted with the same `bbox`.
    pub fn remove(&mut self, key: K, bbox: &Rect) -> bool {
        if self.root.boundary.contains_rect(bbox) {
            self.root.remove(key, bbox)
        } else {
            match self.overflow.iter().position(|(k, _)| *k == key) {
                Some(i) => {
                    self.overflow.swap_remove(i);
                    true
                }
                None => false,
            }
        }
    }

    /// Appends every key whose bounding box intersects `area`.
    pub fn query(&self, area: &Rect, out: &mut Vec<K>) {
        self.root.query(area, out);
        out.extend(
            self.overflow
                .iter()
                .filter(|(_, bbox)| bbox.intersects(area))
                .map(|(key, _)| *key),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn tree() -> QuadTree<u32> {
        QuadTree::new(Rect::new(-100.0, -100.0, 100.0, 100.0))
    }

    fn everything(tree: &QuadTree<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        tree.query(&Rect::new(-1e6, -1e6, 1e6, 1e6), &mut out);
        out
    }

    #[test]
    fn query_after_split() {
        let mut tree = tree();
        for i in 0..200u32 {
            let p = Vec2::new(i as f32 - 100.0, (i % 7) as f32);
            tree.insert(i, Rect::around(p, 0.25));
        }
        assert_eq!(everything(&tree).len(), 200);

        let mut out = Vec::new();
        tree.query(&Rect::new(-1.0, -1.0, 1.0, 10.0), &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![99, 100, 101]);
    }

    #[test]
    fn overflow_items_are_found_and_removed() {
        let mut tree = tree();
        let far = Rect::around(Vec2::new(1000.0, 0.0), 1.0);
        tree.insert(7, far);

        let mut out = Vec::new();
        tree.query(&Rect::new(990.0, -5.0, 1010.0, 5.0), &mut out);
        assert_eq!(out, vec![7]);

        assert!(tree.remove(7, &far));
        assert!(everything(&tree).is_empty());
    }

    #[test]
    fn remove_from_deep_quad() {
        let mut tree = tree();
        let boxes: Vec<Rect> = (0..64u32)
            .map(|i| Rect::around(Vec2::new(50.0 + (i % 8) as f32, 50.0 + (i / 8) as f32), 0.1))
            .collect();
        for (i, bbox) in boxes.iter().enumerate() {
            tree.insert(i as u32, *bbox);
        }

        assert!(tree.remove(10, &boxes[10]));
        assert!(!tree.remove(10, &boxes[10]));

        let mut out = Vec::new();
        tree.query(&boxes[10], &mut out);
        assert!(!out.contains(&10));
        assert_eq!(everything(&tree).len(), 63);
    }
}
