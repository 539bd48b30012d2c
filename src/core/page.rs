//! Schematic model: one page of blocks, pins and wires.
//!
//! A page is an immutable snapshot for the duration of a simulation run. Cross
//! references are by id only; the graph builder turns them into lookup tables.

use crate::core::types::{BlockId, PinDirection, PinId, WireId};
use serde::{Deserialize, Serialize};

/// A connection point, owned by a block or free-standing on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    /// Display name inside the owning block ("I", "S", "R", "O", ...)
    #[serde(default)]
    pub name: String,
    /// Authoritative for block pins. Free pins normally leave it unset and
    /// get a direction inferred from their wires.
    #[serde(default)]
    pub direction: Option<PinDirection>,
    #[serde(default)]
    pub owner: Option<BlockId>,
}

impl Pin {
    pub fn new(id: impl Into<PinId>, direction: PinDirection) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            direction: Some(direction),
            owner: None,
        }
    }

    /// A free-standing pin with no declared direction
    pub fn free(id: impl Into<PinId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            direction: None,
            owner: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// A typed circuit element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Kind tag selecting the evaluator, e.g. "AND" or "SR-SET"
    pub kind: String,
    /// Owned pins in declaration order. Input pins become evaluator input
    /// slots in this order.
    #[serde(default)]
    pub pins: Vec<Pin>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: &str) -> Self {
        Self {
            id: id.into(),
            kind: kind.to_string(),
            pins: Vec::new(),
        }
    }

    pub fn with_pin(mut self, mut pin: Pin) -> Self {
        pin.owner = Some(self.id.clone());
        self.pins.push(pin);
        self
    }

    pub fn input_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(|pin| pin.direction == Some(PinDirection::Input))
    }

    pub fn output_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(|pin| pin.direction == Some(PinDirection::Output))
    }
}

/// A line between two pins. Each endpoint may negate the signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub id: WireId,
    pub start: PinId,
    pub end: PinId,
    #[serde(default)]
    pub invert_start: bool,
    #[serde(default)]
    pub invert_end: bool,
}

impl Wire {
    pub fn new(id: impl Into<WireId>, start: impl Into<PinId>, end: impl Into<PinId>) -> Self {
        Self {
            id: id.into(),
            start: start.into(),
            end: end.into(),
            invert_start: false,
            invert_end: false,
        }
    }

    pub fn inverted(mut self, invert_start: bool, invert_end: bool) -> Self {
        self.invert_start = invert_start;
        self.invert_end = invert_end;
        self
    }

    /// Invert flag of the endpoint attached to `pin`
    pub fn invert_at(&self, pin: &PinId) -> bool {
        if &self.start == pin {
            self.invert_start
        } else {
            self.invert_end
        }
    }

    /// The endpoint opposite `pin`
    pub fn other_end(&self, pin: &PinId) -> &PinId {
        if &self.start == pin {
            &self.end
        } else {
            &self.start
        }
    }
}

/// Snapshot of one page handed over by the editing layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Free-standing pins (wire junctions) that belong to the page itself
    #[serde(default)]
    pub pins: Vec<Pin>,
    #[serde(default)]
    pub wires: Vec<Wire>,
}

impl Page {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    /// Parse a page snapshot from JSON
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_with_pin_sets_owner() {
        let block = Block::new("and0", "AND")
            .with_pin(Pin::new("and0.a", PinDirection::Input))
            .with_pin(Pin::new("and0.o", PinDirection::Output));
        assert!(block
            .pins
            .iter()
            .all(|pin| pin.owner == Some(BlockId::new("and0"))));
        assert_eq!(block.input_pins().count(), 1);
        assert_eq!(block.output_pins().count(), 1);
    }

    #[test]
    fn wire_endpoint_helpers() {
        let wire = Wire::new("w0", "a", "b").inverted(true, false);
        assert!(wire.invert_at(&PinId::new("a")));
        assert!(!wire.invert_at(&PinId::new("b")));
        assert_eq!(wire.other_end(&PinId::new("a")), &PinId::new("b"));
    }

    #[test]
    fn page_parses_minimal_json() {
        let json = r#"{
            "blocks": [
                { "id": "s", "kind": "SIGNAL", "pins": [ { "id": "s.o", "direction": "Output" } ] }
            ],
            "wires": [ { "id": "w", "start": "s.o", "end": "j" } ],
            "pins": [ { "id": "j" } ]
        }"#;
        let page = Page::from_json(json).unwrap();
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.pins[0].direction, None);
        assert!(!page.wires[0].invert_start);
    }
}
