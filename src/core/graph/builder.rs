use crate::core::components::kinds;
use crate::core::errors::GraphError;
use crate::core::graph::context::{BlockEntry, Dependency, GraphContext};
use crate::core::graph::execution_order::{ExecutionOrderBuilder, OrderNode};
use crate::core::page::{Page, Wire};
use crate::core::types::{BlockId, PinDirection, PinId};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Lookup tables over a page, by id
struct PageIndex<'a> {
    page: &'a Page,
    /// Owning block index of every block pin
    owners: HashMap<&'a PinId, usize>,
    /// Every known pin with its declared direction
    declared: HashMap<&'a PinId, Option<PinDirection>>,
    /// Wire indices attached to each pin
    wires_at: HashMap<&'a PinId, Vec<usize>>,
}

impl<'a> PageIndex<'a> {
    fn new(page: &'a Page) -> Result<Self, GraphError> {
        let mut block_ids = HashSet::new();
        let mut owners = HashMap::new();
        let mut declared = HashMap::new();

        for (index, block) in page.blocks.iter().enumerate() {
            if !block_ids.insert(&block.id) {
                return Err(GraphError::DuplicateBlock(block.id.clone()));
            }
            for pin in &block.pins {
                if let Some(owner) = &pin.owner {
                    if owner != &block.id {
                        return Err(GraphError::OwnerMismatch {
                            block: block.id.clone(),
                            pin: pin.id.clone(),
                            owner: owner.clone(),
                        });
                    }
                }
                if pin.direction.is_none() {
                    return Err(GraphError::UndirectedBlockPin {
                        block: block.id.clone(),
                        pin: pin.id.clone(),
                    });
                }
                if declared.insert(&pin.id, pin.direction).is_some() {
                    return Err(GraphError::DuplicatePin(pin.id.clone()));
                }
                owners.insert(&pin.id, index);
            }
        }

        for pin in &page.pins {
            if declared.insert(&pin.id, pin.direction).is_some() {
                return Err(GraphError::DuplicatePin(pin.id.clone()));
            }
        }

        let mut wires_at: HashMap<&PinId, Vec<usize>> = HashMap::new();
        for (index, wire) in page.wires.iter().enumerate() {
            for end in [&wire.start, &wire.end] {
                if !declared.contains_key(end) {
                    return Err(GraphError::UnknownPin {
                        wire: wire.id.clone(),
                        pin: end.clone(),
                    });
                }
            }
            wires_at.entry(&wire.start).or_default().push(index);
            if wire.end != wire.start {
                wires_at.entry(&wire.end).or_default().push(index);
            }
        }

        Ok(Self {
            page,
            owners,
            declared,
            wires_at,
        })
    }

    fn wires(&self, pin: &PinId) -> impl Iterator<Item = &'a Wire> + '_ {
        let page = self.page;
        self.wires_at
            .get(pin)
            .into_iter()
            .flatten()
            .map(move |&index| &page.wires[index])
    }

    fn owner_kind(&self, pin: &PinId) -> Option<&'a str> {
        let page = self.page;
        self.owners
            .get(pin)
            .map(|&index| page.blocks[index].kind.as_str())
    }
}

/// Resolves a page into a [`GraphContext`]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn build(page: &Page) -> Result<GraphContext, GraphError> {
        let index = PageIndex::new(page)?;

        let connections = Self::find_connections(&index);
        let pin_types = Self::find_pin_types(&index)?;
        let dependencies = Self::find_dependencies(&index, &pin_types);
        let stages = Self::order_blocks(&index, &pin_types, &dependencies);
        let ordered_blocks: Vec<BlockId> = stages.iter().flatten().cloned().collect();

        let blocks = page
            .blocks
            .iter()
            .enumerate()
            .map(|(position, block)| {
                let entry = BlockEntry {
                    id: block.id.clone(),
                    kind: block.kind.clone(),
                    inputs: block.input_pins().map(|pin| pin.id.clone()).collect(),
                    outputs: block.output_pins().map(|pin| pin.id.clone()).collect(),
                    index: position,
                };
                (block.id.clone(), entry)
            })
            .collect();
        let pin_owners = index
            .owners
            .iter()
            .map(|(&pin, &owner)| (pin.clone(), page.blocks[owner].id.clone()))
            .collect();

        debug!(
            "Graph for page '{}': {} blocks, {} pins, {} wires, {} stages",
            page.name,
            page.blocks.len(),
            pin_types.len(),
            page.wires.len(),
            stages.len()
        );

        Ok(GraphContext {
            pin_types,
            connections,
            dependencies,
            stages,
            ordered_blocks,
            blocks,
            pin_owners,
        })
    }

    fn find_connections(index: &PageIndex) -> BTreeMap<PinId, BTreeSet<PinId>> {
        let mut connections: BTreeMap<PinId, BTreeSet<PinId>> = index
            .declared
            .keys()
            .map(|&pin| (pin.clone(), BTreeSet::new()))
            .collect();

        for wire in &index.page.wires {
            if let Some(set) = connections.get_mut(&wire.start) {
                set.insert(wire.end.clone());
            }
            if let Some(set) = connections.get_mut(&wire.end) {
                set.insert(wire.start.clone());
            }
        }
        connections
    }

    /// Block pins keep their declared direction. Free pins without one follow
    /// the wire convention: signal flows from a wire's start to its end, so a
    /// pin ending any wire is an input and a pin only starting wires an output.
    fn find_pin_types(index: &PageIndex) -> Result<BTreeMap<PinId, PinDirection>, GraphError> {
        let mut pins: Vec<(&PinId, Option<PinDirection>)> =
            index.declared.iter().map(|(&pin, &declared)| (pin, declared)).collect();
        pins.sort();

        let mut pin_types = BTreeMap::new();
        for (pin, declared) in pins {
            let direction = match declared {
                Some(direction) => direction,
                None => {
                    let mut wires = index.wires(pin).peekable();
                    if wires.peek().is_none() {
                        return Err(GraphError::UndirectedFreePin(pin.clone()));
                    }
                    if wires.any(|wire| &wire.end == pin) {
                        PinDirection::Input
                    } else {
                        PinDirection::Output
                    }
                }
            };
            pin_types.insert(pin.clone(), direction);
        }
        Ok(pin_types)
    }

    fn find_dependencies(
        index: &PageIndex,
        pin_types: &BTreeMap<PinId, PinDirection>,
    ) -> BTreeMap<PinId, BTreeSet<Dependency>> {
        pin_types
            .iter()
            .filter(|(_, &direction)| direction == PinDirection::Input)
            .map(|(pin, _)| (pin.clone(), Self::trace_sources(index, pin)))
            .collect()
    }

    /// Breadth-first walk from an input pin through wires, free pins, input
    /// pins and SHORTCUT blocks until block output pins are reached. The
    /// parity of traversed invert flags rides along with every visited pin.
    fn trace_sources(index: &PageIndex, start: &PinId) -> BTreeSet<Dependency> {
        let mut sources = BTreeSet::new();
        let mut visited: HashSet<(&PinId, bool)> = HashSet::new();
        let mut queue: VecDeque<(&PinId, bool)> = VecDeque::new();

        visited.insert((start, false));
        queue.push_back((start, false));

        while let Some((pin, parity)) = queue.pop_front() {
            for wire in index.wires(pin) {
                if wire.start == wire.end {
                    continue;
                }
                let next = wire.other_end(pin);
                let next_parity = parity ^ wire.invert_at(pin) ^ wire.invert_at(next);

                let is_output = index.owners.contains_key(next)
                    && index.declared.get(next).copied().flatten() == Some(PinDirection::Output);
                if !is_output {
                    if visited.insert((next, next_parity)) {
                        queue.push_back((next, next_parity));
                    }
                    continue;
                }

                if index.owner_kind(next) == Some(kinds::SHORTCUT) {
                    let shortcut = &index.page.blocks[index.owners[next]];
                    for input in shortcut.input_pins() {
                        if visited.insert((&input.id, next_parity)) {
                            queue.push_back((&input.id, next_parity));
                        }
                    }
                } else {
                    sources.insert(Dependency::new(next.clone(), next_parity));
                }
            }
        }
        sources
    }

    fn order_blocks(
        index: &PageIndex,
        pin_types: &BTreeMap<PinId, PinDirection>,
        dependencies: &BTreeMap<PinId, BTreeSet<Dependency>>,
    ) -> Vec<Vec<BlockId>> {
        let blocks = &index.page.blocks;
        let nodes: Vec<OrderNode> = blocks
            .iter()
            .map(|block| OrderNode {
                stateful: !kinds::is_combinational(&block.kind),
            })
            .collect();

        let mut edges = BTreeSet::new();
        for (target, block) in blocks.iter().enumerate() {
            for pin in &block.pins {
                if pin_types.get(&pin.id) != Some(&PinDirection::Input) {
                    continue;
                }
                for dep in dependencies.get(&pin.id).into_iter().flatten() {
                    if let Some(&source) = index.owners.get(&dep.source) {
                        edges.insert((source, target));
                    }
                }
            }
        }

        ExecutionOrderBuilder::build_stages(&nodes, &edges)
            .into_iter()
            .map(|stage| stage.into_iter().map(|i| blocks[i].id.clone()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::page_builder::PageBuilder;
    use crate::core::page::{Block, Pin, Wire};

    fn pin(id: &str) -> PinId {
        PinId::new(id)
    }

    fn deps(context: &GraphContext, id: &str) -> Vec<(String, bool)> {
        context
            .dependencies_of(&pin(id))
            .unwrap()
            .iter()
            .map(|dep| (dep.source.to_string(), dep.inverted))
            .collect()
    }

    #[test]
    fn direct_wire_resolves_dependency_and_order() {
        let mut builder = PageBuilder::new("direct");
        let not = builder.add_block(kinds::INVERTER, &["I"], &["O"]);
        let signal = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        builder.connect(&signal, "O", &not, "I").unwrap();
        let context = GraphBuilder::build(&builder.build()).unwrap();

        assert_eq!(deps(&context, "inverter0.I"), vec![("signal1.O".to_string(), false)]);
        assert_eq!(context.ordered_blocks(), &[signal, not]);
    }

    #[test]
    fn inversion_is_xor_of_traversed_flags() {
        let mut builder = PageBuilder::new("xor");
        let signal = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        let or = builder.add_block(kinds::OR, &["A", "B"], &["O"]);
        let junction = builder.add_free_pin();
        let source = builder.pin(&signal, "O").unwrap();
        let a = builder.pin(&or, "A").unwrap();
        let b = builder.pin(&or, "B").unwrap();
        builder.wire_inverted(&source, &junction, true, false).unwrap();
        builder.wire_inverted(&junction, &a, false, true).unwrap();
        builder.wire(&junction, &b).unwrap();
        let context = GraphBuilder::build(&builder.build()).unwrap();

        assert_eq!(deps(&context, a.id()), vec![(source.to_string(), false)]);
        assert_eq!(deps(&context, b.id()), vec![(source.to_string(), true)]);
        assert_eq!(context.pin_type(&junction), Some(PinDirection::Input));
    }

    #[test]
    fn shortcut_is_transparent_for_dependencies() {
        let mut builder = PageBuilder::new("shortcut");
        let signal = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        let shortcut = builder.add_block(kinds::SHORTCUT, &["I"], &["O"]);
        let not = builder.add_block(kinds::INVERTER, &["I"], &["O"]);
        builder.connect_inverted(&signal, "O", &shortcut, "I", true, false).unwrap();
        builder.connect(&shortcut, "O", &not, "I").unwrap();
        let context = GraphBuilder::build(&builder.build()).unwrap();

        assert_eq!(deps(&context, "inverter2.I"), vec![("signal0.O".to_string(), true)]);
        assert_eq!(deps(&context, "shortcut1.I"), vec![("signal0.O".to_string(), true)]);
        assert_eq!(context.ordered_blocks().len(), 3);
    }

    #[test]
    fn unconnected_input_has_no_dependencies() {
        let mut builder = PageBuilder::new("open");
        builder.add_block(kinds::AND, &["A", "B"], &["O"]);
        let context = GraphBuilder::build(&builder.build()).unwrap();
        assert!(deps(&context, "and0.A").is_empty());
        assert!(context.connections()[&pin("and0.A")].is_empty());
    }

    #[test]
    fn connections_are_symmetric() {
        let mut builder = PageBuilder::new("sym");
        let signal = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        let not = builder.add_block(kinds::INVERTER, &["I"], &["O"]);
        builder.connect(&signal, "O", &not, "I").unwrap();
        let context = GraphBuilder::build(&builder.build()).unwrap();
        for (a, connected) in context.connections() {
            for b in connected {
                assert!(context.connections()[b].contains(a));
            }
        }
    }

    #[test]
    fn free_pin_direction_follows_wire_convention() {
        let page = Page {
            name: "free".into(),
            blocks: vec![Block::new("s", kinds::SIGNAL).with_pin(Pin::new("s.O", PinDirection::Output))],
            pins: vec![Pin::free("start"), Pin::free("end")],
            wires: vec![Wire::new("w0", "start", "end"), Wire::new("w1", "s.O", "start")],
        };
        let context = GraphBuilder::build(&page).unwrap();
        assert_eq!(context.pin_type(&pin("end")), Some(PinDirection::Input));
        assert_eq!(context.pin_type(&pin("start")), Some(PinDirection::Input));

        let page = Page {
            pins: vec![Pin::free("lonely"), Pin::free("tail")],
            wires: vec![Wire::new("w0", "lonely", "tail")],
            ..Page::default()
        };
        let context = GraphBuilder::build(&page).unwrap();
        assert_eq!(context.pin_type(&pin("lonely")), Some(PinDirection::Output));
    }

    #[test]
    fn free_pin_without_wires_is_malformed() {
        let page = Page {
            pins: vec![Pin::free("stray")],
            ..Page::default()
        };
        assert_eq!(
            GraphBuilder::build(&page).unwrap_err(),
            GraphError::UndirectedFreePin(pin("stray"))
        );
    }

    #[test]
    fn malformed_pages_are_rejected() {
        let dangling = Page {
            blocks: vec![Block::new("s", kinds::SIGNAL).with_pin(Pin::new("s.O", PinDirection::Output))],
            wires: vec![Wire::new("w", "s.O", "missing")],
            ..Page::default()
        };
        assert!(matches!(
            GraphBuilder::build(&dangling),
            Err(GraphError::UnknownPin { .. })
        ));

        let duplicate = Page {
            blocks: vec![Block::new("a", kinds::AND), Block::new("a", kinds::OR)],
            ..Page::default()
        };
        assert_eq!(
            GraphBuilder::build(&duplicate).unwrap_err(),
            GraphError::DuplicateBlock(BlockId::new("a"))
        );

        let mut foreign = Pin::new("p", PinDirection::Input);
        foreign.owner = Some(BlockId::new("b"));
        let mismatch = Page {
            blocks: vec![Block {
                id: BlockId::new("a"),
                kind: kinds::AND.to_string(),
                pins: vec![foreign],
            }],
            ..Page::default()
        };
        assert!(matches!(
            GraphBuilder::build(&mismatch),
            Err(GraphError::OwnerMismatch { .. })
        ));

        let undirected = Page {
            blocks: vec![Block::new("a", kinds::AND).with_pin(Pin::free("a.I"))],
            ..Page::default()
        };
        assert!(matches!(
            GraphBuilder::build(&undirected),
            Err(GraphError::UndirectedBlockPin { .. })
        ));
    }

    #[test]
    fn latch_feedback_orders_latch_first() {
        // AND(S, !Q) -> latch set, latch Q -> AND
        let mut builder = PageBuilder::new("feedback");
        let and = builder.add_block(kinds::AND, &["A", "B"], &["O"]);
        let latch = builder.add_block(kinds::SR_RESET, &["S", "R"], &["Q"]);
        let signal = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        builder.connect(&signal, "O", &and, "A").unwrap();
        builder.connect_inverted(&latch, "Q", &and, "B", true, false).unwrap();
        builder.connect(&and, "O", &latch, "S").unwrap();
        let context = GraphBuilder::build(&builder.build()).unwrap();

        assert_eq!(context.ordered_blocks(), &[signal, latch, and]);
    }

    #[test]
    fn unknown_kinds_order_as_state_holding() {
        // AND <-> PLUGIN loop, the plugin is released first
        let mut builder = PageBuilder::new("plugin loop");
        let and = builder.add_block(kinds::AND, &["A"], &["O"]);
        let plugin = builder.add_block("PLUGIN", &["I"], &["O"]);
        builder.connect(&and, "O", &plugin, "I").unwrap();
        builder.connect(&plugin, "O", &and, "A").unwrap();
        let context = GraphBuilder::build(&builder.build()).unwrap();

        assert_eq!(context.ordered_blocks(), &[plugin, and]);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let mut builder = PageBuilder::new("stable");
        let s0 = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        let s1 = builder.add_block(kinds::SIGNAL, &[], &["O"]);
        let and = builder.add_block(kinds::AND, &["A", "B"], &["O"]);
        let timer = builder.add_block(kinds::TIMER_ON, &["I"], &["O"]);
        builder.connect(&s0, "O", &and, "A").unwrap();
        builder.connect(&s1, "O", &and, "B").unwrap();
        builder.connect(&and, "O", &timer, "I").unwrap();
        let page = builder.build();

        let first = GraphBuilder::build(&page).unwrap();
        let second = GraphBuilder::build(&page).unwrap();
        assert_eq!(first.ordered_blocks(), second.ordered_blocks());
        assert_eq!(first.dump(), second.dump());
        assert_eq!(first.stages().len(), 3);
    }
}
