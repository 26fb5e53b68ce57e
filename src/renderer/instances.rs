//! Per-category instance records split into an unselected and a selected
//! partition, and the colors each partition is drawn with.

use super::buffer::{BufferError, ManagedBuffer};
use super::counter::PartitionCounts;
use crate::config::EngineOptions;
use crate::graph_data::Rgba;
use crate::selection::SelectionState;

/// Blend toward white for selected elements.
const HIGHLIGHT: f32 = 0.35;

/// Records of one category: all unselected records, then all selected ones.
/// Every element owns `records_per_element` consecutive records.
#[derive(Debug)]
pub struct PartitionedInstances<T: bytemuck::Pod> {
    records: ManagedBuffer<T>,
    counts: PartitionCounts,
    records_per_element: usize,
}

impl<T: bytemuck::Pod> Default for PartitionedInstances<T> {
    fn default() -> Self {
        Self {
            records: ManagedBuffer::default(),
            counts: PartitionCounts::default(),
            records_per_element: 1,
        }
    }
}

impl<T: bytemuck::Pod> PartitionedInstances<T> {
    /// Replaces the contents and returns the element count of each
    /// partition. `reserve` is the expected total record count; capacity is
    /// grown to fit it before anything is written.
    pub fn fill(
        &mut self,
        reserve: usize,
        records_per_element: usize,
        unselected: impl Iterator<Item = T>,
        selected: impl Iterator<Item = T>,
    ) -> Result<PartitionCounts, BufferError> {
        self.records.clear();
        self.counts = PartitionCounts::default();
        self.records_per_element = records_per_element.max(1);
        self.records.ensure_capacity(reserve)?;

        for record in unselected {
            self.records.push(record)?;
        }
        let split = self.records.len();
        for record in selected {
            self.records.push(record)?;
        }

        let per_element = self.records_per_element;
        // Record offsets are addressed as u32 on the GPU side.
        count(self.records.len())?;
        self.counts = PartitionCounts {
            unselected: count(split / per_element)?,
            selected: count((self.records.len() - split) / per_element)?,
        };
        Ok(self.counts)
    }

    pub fn counts(&self) -> PartitionCounts {
        self.counts
    }

    pub fn records(&self) -> &[T] {
        self.records.as_slice()
    }

    pub fn records_per_element(&self) -> usize {
        self.records_per_element
    }

    pub fn unselected(&self) -> &[T] {
        &self.records()[..self.split()]
    }

    pub fn selected(&self) -> &[T] {
        &self.records()[self.split()..]
    }

    fn split(&self) -> usize {
        self.counts.unselected as usize * self.records_per_element
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.records.as_bytes()
    }
}

fn count(len: usize) -> Result<u32, BufferError> {
    u32::try_from(len).map_err(|_| BufferError::OutOfMemory { requested: len })
}

/// Color rules for one frame.
#[derive(Copy, Clone, Debug)]
pub struct Palette {
    background: Rgba,
    fade: Option<f32>,
    selection_active: bool,
}

impl Palette {
    pub fn new(options: &EngineOptions, selection: &SelectionState) -> Self {
        Self {
            background: options.background_color,
            fade: options.unselected_fade(),
            selection_active: !selection.is_empty(),
        }
    }

    pub fn selection_active(&self) -> bool {
        self.selection_active
    }

    /// Pulled toward the background while something else is selected.
    pub fn unselected(&self, color: Rgba) -> Rgba {
        match self.fade {
            Some(factor) if self.selection_active => color.mix(self.background, factor),
            _ => color,
        }
    }

    pub fn selected(&self, color: Rgba) -> Rgba {
        color.mix(Rgba::WHITE, HIGHLIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn unselected_records_precede_selected() {
        let mut instances = PartitionedInstances::<u32>::default();
        let values = [1, 2, 3, 4, 5, 6, 7];
        let counts = instances
            .fill(
                values.len(),
                1,
                values.iter().copied().filter(|v| v % 3 != 0),
                values.iter().copied().filter(|v| v % 3 == 0),
            )
            .unwrap();

        assert_eq!(counts, PartitionCounts { unselected: 5, selected: 2 });
        assert_eq!(instances.unselected(), &[1, 2, 4, 5, 7]);
        assert_eq!(instances.selected(), &[3, 6]);
        assert_eq!(instances.capacity(), 8);
    }

    #[test]
    fn counts_are_in_elements() {
        let mut instances = PartitionedInstances::<u32>::default();
        let counts = instances
            .fill(10, 2, [1, 1, 2, 2, 3, 3].into_iter(), [4, 4, 5, 5].into_iter())
            .unwrap();

        assert_eq!(counts, PartitionCounts { unselected: 3, selected: 2 });
        assert_eq!(instances.unselected(), &[1, 1, 2, 2, 3, 3]);
        assert_eq!(instances.selected(), &[4, 4, 5, 5]);
        assert_eq!(counts.records(2).total() as usize, instances.records().len());
    }

    #[test]
    fn refill_with_nothing_empties_both_partitions() {
        let mut instances = PartitionedInstances::<u32>::default();
        instances.fill(2, 1, [1].into_iter(), [2].into_iter()).unwrap();
        let counts = instances.fill(0, 1, std::iter::empty(), std::iter::empty()).unwrap();
        assert_eq!(counts, PartitionCounts::default());
        assert!(instances.records().is_empty());
    }

    #[test]
    fn fading_only_applies_while_selecting() {
        let options = EngineOptions::default();
        let color = Rgba::new(0, 0, 0, 255);

        let idle = Palette::new(&options, &SelectionState::default());
        assert_eq!(idle.unselected(color), color);

        let mut graph = crate::graph_data::GraphModel::new();
        let node = graph.add_node(Vec2::ZERO, 1.0, color);
        let active = Palette::new(&options, &SelectionState::for_node(&graph, node, true));
        assert_ne!(active.unselected(color), color);
        assert_eq!(active.unselected(color).channels()[3], 255);
    }
}
