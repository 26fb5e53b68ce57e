/// Element counts of one category's partitions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    pub unselected: u32,
    pub selected: u32,
}

impl PartitionCounts {
    pub fn total(&self) -> u32 {
        self.unselected + self.selected
    }

    /// The same partitions measured in records.
    pub fn records(self, per_element: u32) -> Self {
        Self {
            unselected: self.unselected * per_element,
            selected: self.selected * per_element,
        }
    }
}

/// Counts written by the builder, and the snapshot the draw step reads.
///
/// The snapshot only changes through [`InstanceCounter::promote`], which the
/// executor calls after the upload of the matching data has been queued.
#[derive(Debug, Default)]
pub struct InstanceCounter {
    pending: PartitionCounts,
    to_draw: PartitionCounts,
}

impl InstanceCounter {
    pub fn set(&mut self, counts: PartitionCounts) {
        self.pending = counts;
    }

    pub fn pending(&self) -> PartitionCounts {
        self.pending
    }

    pub fn promote(&mut self) {
        self.to_draw = self.pending;
    }

    pub fn to_draw(&self) -> PartitionCounts {
        self.to_draw
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
