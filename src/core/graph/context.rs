use crate::core::types::{BlockId, PinDirection, PinId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{self, Write};

/// A resolved signal source feeding an input pin
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
    /// Block-owned output pin the signal originates from
    pub source: PinId,
    /// XOR of every invert flag traversed between source and input
    pub inverted: bool,
}

impl Dependency {
    pub fn new(source: PinId, inverted: bool) -> Self {
        Self { source, inverted }
    }
}

/// Per-block summary kept for evaluator wiring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub id: BlockId,
    pub kind: String,
    /// Input pins in declaration order, one evaluator slot each
    pub inputs: Vec<PinId>,
    pub outputs: Vec<PinId>,
    /// Declaration index on the page
    pub index: usize,
}

/// Read-only connectivity and ordering snapshot of one page.
///
/// Rebuilt for every simulation run. All maps enumerate in id order so the
/// diagnostic dump is reproducible byte for byte.
#[derive(Debug, Clone, Default)]
pub struct GraphContext {
    pub(crate) pin_types: BTreeMap<PinId, PinDirection>,
    pub(crate) connections: BTreeMap<PinId, BTreeSet<PinId>>,
    pub(crate) dependencies: BTreeMap<PinId, BTreeSet<Dependency>>,
    pub(crate) stages: Vec<Vec<BlockId>>,
    pub(crate) ordered_blocks: Vec<BlockId>,
    pub(crate) blocks: HashMap<BlockId, BlockEntry>,
    pub(crate) pin_owners: HashMap<PinId, BlockId>,
}

impl GraphContext {
    /// Direction of every pin, inferred ones included
    pub fn pin_types(&self) -> &BTreeMap<PinId, PinDirection> {
        &self.pin_types
    }

    /// Directly wired pins, symmetric
    pub fn connections(&self) -> &BTreeMap<PinId, BTreeSet<PinId>> {
        &self.connections
    }

    /// Resolved sources of every input-typed pin
    pub fn dependencies(&self) -> &BTreeMap<PinId, BTreeSet<Dependency>> {
        &self.dependencies
    }

    pub fn ordered_blocks(&self) -> &[BlockId] {
        &self.ordered_blocks
    }

    /// Ordering stages; blocks within a stage have no dependency on each other
    pub fn stages(&self) -> &[Vec<BlockId>] {
        &self.stages
    }

    pub fn pin_type(&self, pin: &PinId) -> Option<PinDirection> {
        self.pin_types.get(pin).copied()
    }

    pub fn dependencies_of(&self, pin: &PinId) -> Option<&BTreeSet<Dependency>> {
        self.dependencies.get(pin)
    }

    pub fn block(&self, id: &BlockId) -> Option<&BlockEntry> {
        self.blocks.get(id)
    }

    /// Owning block of a pin, `None` for free pins
    pub fn owner(&self, pin: &PinId) -> Option<&BlockId> {
        self.pin_owners.get(pin)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn write_connections(&self, w: &mut impl Write) -> fmt::Result {
        writeln!(w, "Connections:")?;
        for (pin, connected) in &self.connections {
            write!(w, "{} ->", pin)?;
            for other in connected {
                write!(w, " {}", other)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn write_dependencies(&self, w: &mut impl Write) -> fmt::Result {
        writeln!(w, "Dependencies:")?;
        for (pin, deps) in &self.dependencies {
            write!(w, "{} <-", pin)?;
            for dep in deps {
                if dep.inverted {
                    write!(w, " !{}", dep.source)?;
                } else {
                    write!(w, " {}", dep.source)?;
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn write_pin_types(&self, w: &mut impl Write) -> fmt::Result {
        writeln!(w, "PinTypes:")?;
        for (pin, direction) in &self.pin_types {
            writeln!(w, "{} {}", pin, direction)?;
        }
        Ok(())
    }

    pub fn write_ordered_blocks(&self, w: &mut impl Write) -> fmt::Result {
        writeln!(w, "OrderedBlocks:")?;
        for id in &self.ordered_blocks {
            match self.blocks.get(id) {
                Some(entry) => writeln!(w, "{} {}", id, entry.kind)?,
                None => writeln!(w, "{}", id)?,
            }
        }
        Ok(())
    }

    /// All four diagnostic sections in their canonical order
    pub fn dump(&self) -> String {
        let mut text = String::new();
        // Writing into a String never fails.
        let _ = self
            .write_connections(&mut text)
            .and_then(|_| self.write_dependencies(&mut text))
            .and_then(|_| self.write_pin_types(&mut text))
            .and_then(|_| self.write_ordered_blocks(&mut text));
        text
    }
}
