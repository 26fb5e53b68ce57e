//! Drawing strategies, their availability probes, and the registry that picks
//! one winner per visual category.

use super::capabilities::Capabilities;
use crate::config::EngineOptions;
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;

/// A class of visual elements that strategies compete to render.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Nodes,
    Edges,
}

impl Category {
    /// Draw order within a layer; lower draws first, so edges end up behind nodes.
    pub const fn order(self) -> i32 {
        match self {
            Self::Edges => 0,
            Self::Nodes => 100,
        }
    }
}

/// One concrete GPU drawing technique.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StrategyKind {
    /// Every element expanded into vertices on the CPU, drawn as plain triangles.
    ArrayDraw,
    /// One quad instanced once per element record.
    Instanced,
    /// Instanced draws described by a GPU-side command buffer.
    Indirect,
}

impl StrategyKind {
    pub const fn preference(self) -> i32 {
        match self {
            Self::ArrayDraw => 0,
            Self::Instanced => 50,
            Self::Indirect => 100,
        }
    }

    /// Built-in availability probe. Never fails.
    pub fn is_available(self, caps: &Capabilities, options: &EngineOptions) -> bool {
        match self {
            Self::ArrayDraw => !options.disable_vertex_arrays,
            Self::Instanced => caps.instancing && !options.disable_instanced_drawing,
            Self::Indirect => {
                caps.instancing
                    && caps.indirect_draw
                    && caps.base_instance
                    && !options.disable_indirect_drawing
            }
        }
    }
}

/// A strategy implementation tag: one per category and technique.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StrategyTag {
    pub category: Category,
    pub kind: StrategyKind,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.category)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("availability probe failed: {0}")]
pub struct ProbeError(pub String);

pub type Probe = fn(&Capabilities, &EngineOptions) -> Result<bool, ProbeError>;

struct StrategyEntry {
    tag: StrategyTag,
    probe: Option<Probe>,
}

impl StrategyEntry {
    fn available(&self, caps: &Capabilities, options: &EngineOptions) -> bool {
        let Some(probe) = self.probe else {
            return self.tag.kind.is_available(caps, options);
        };
        match probe(caps, options) {
            Ok(available) => available,
            Err(err) => {
                log::warn!("{} treated as unavailable: {err}", self.tag);
                false
            }
        }
    }
}

/// Registered strategy implementations in declaration order.
#[derive(Default)]
pub struct StrategyRegistry {
    entries: Vec<StrategyEntry>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Array-draw, instanced and indirect for both categories.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for category in Category::iter() {
            for kind in StrategyKind::iter() {
                registry.register(StrategyTag { category, kind });
            }
        }
        registry
    }

    pub fn register(&mut self, tag: StrategyTag) {
        self.entries.push(StrategyEntry { tag, probe: None });
    }

    /// Registers `tag` with a custom availability probe replacing the built-in one.
    pub fn register_with_probe(&mut self, tag: StrategyTag, probe: Probe) {
        self.entries.push(StrategyEntry {
            tag,
            probe: Some(probe),
        });
    }

    /// The available strategy with the highest preference; on equal preference
    /// the first registered wins. `None` when nothing is available.
    pub fn select(
        &self,
        category: Category,
        caps: &Capabilities,
        options: &EngineOptions,
    ) -> Option<StrategyKind> {
        let mut best: Option<StrategyKind> = None;
        for entry in self.entries.iter().filter(|e| e.tag.category == category) {
            if !entry.available(caps, options) {
                continue;
            }
            let kind = entry.tag.kind;
            if best.is_none_or(|current| kind.preference() > current.preference()) {
                best = Some(kind);
            }
        }
        best
    }
}
