/// Ordered draw passes of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Unselected elements.
    Back,
    /// Selected elements and their highlighted neighbours, drawn on top.
    Middle,
}

impl Layer {
    /// Fixed per-frame draw order.
    pub const ORDERED: [Self; 2] = [Self::Back, Self::Middle];
}
