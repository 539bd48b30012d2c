use crate::core::errors::GraphError;
use crate::core::page::{Block, Page, Pin, Wire};
use crate::core::types::{BlockId, PinDirection, PinId, WireId};

/// Imperative API for assembling a page
///
/// Blocks and free pins get generated ids (`<kind><n>`, `pin<n>`), block pins
/// are named `<block>.<pin name>`. Every connection is validated against the
/// pins created so far.
pub struct PageBuilder {
    page: Page,
    /// Counter for automatic block and pin ID generation
    id_counter: u64,
    wire_counter: u64,
}

impl PageBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            page: Page::new(name),
            id_counter: 0,
            wire_counter: 0,
        }
    }

    /// Add a block of `kind` with named input and output pins
    pub fn add_block(&mut self, kind: &str, inputs: &[&str], outputs: &[&str]) -> BlockId {
        let counter = self.next_id();
        let id = BlockId::new(format!("{}{}", kind.to_lowercase(), counter));

        let mut block = Block::new(id.clone(), kind);
        for (names, direction) in [(inputs, PinDirection::Input), (outputs, PinDirection::Output)] {
            for name in names {
                let pin_id = PinId::new(format!("{}.{}", id, name));
                block = block.with_pin(Pin::new(pin_id, direction).named(name));
            }
        }

        self.page.blocks.push(block);
        id
    }

    /// Add a free-standing junction pin
    pub fn add_free_pin(&mut self) -> PinId {
        let counter = self.next_id();
        let id = PinId::new(format!("pin{}", counter));
        self.page.pins.push(Pin::free(id.clone()));
        id
    }

    /// Look up a block pin by its name
    pub fn pin(&self, block: &BlockId, name: &str) -> Result<PinId, GraphError> {
        self.page
            .block(block)
            .and_then(|b| b.pins.iter().find(|pin| pin.name == name))
            .map(|pin| pin.id.clone())
            .ok_or_else(|| GraphError::UnknownBlockPin {
                block: block.clone(),
                pin: name.to_string(),
            })
    }

    /// Wire `source.output` to `target.input`
    pub fn connect(
        &mut self,
        source: &BlockId,
        output: &str,
        target: &BlockId,
        input: &str,
    ) -> Result<WireId, GraphError> {
        self.connect_inverted(source, output, target, input, false, false)
    }

    pub fn connect_inverted(
        &mut self,
        source: &BlockId,
        output: &str,
        target: &BlockId,
        input: &str,
        invert_start: bool,
        invert_end: bool,
    ) -> Result<WireId, GraphError> {
        let start = self.pin(source, output)?;
        let end = self.pin(target, input)?;
        self.wire_inverted(&start, &end, invert_start, invert_end)
    }

    pub fn wire(&mut self, start: &PinId, end: &PinId) -> Result<WireId, GraphError> {
        self.wire_inverted(start, end, false, false)
    }

    /// Add a wire between two existing pins
    pub fn wire_inverted(
        &mut self,
        start: &PinId,
        end: &PinId,
        invert_start: bool,
        invert_end: bool,
    ) -> Result<WireId, GraphError> {
        let id = WireId::new(format!("wire{}", self.wire_counter));

        for pin in [start, end] {
            if !self.has_pin(pin) {
                return Err(GraphError::UnknownPin {
                    wire: id,
                    pin: pin.clone(),
                });
            }
        }

        self.wire_counter += 1;
        self.page
            .wires
            .push(Wire::new(id.clone(), start.clone(), end.clone()).inverted(invert_start, invert_end));
        Ok(id)
    }

    pub fn has_pin(&self, id: &PinId) -> bool {
        self.page.pins.iter().any(|pin| &pin.id == id)
            || self
                .page
                .blocks
                .iter()
                .any(|block| block.pins.iter().any(|pin| &pin.id == id))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn build(self) -> Page {
        self.page
    }

    fn next_id(&mut self) -> u64 {
        let counter = self.id_counter;
        self.id_counter += 1;
        counter
    }
}
