use crate::core::components::signal::SignalHandle;
use crate::core::components::traits::Evaluator;
use crate::core::errors::SimulationError;
use crate::core::execution::clock::Clock;
use crate::core::types::BlockId;
use log::trace;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};

/// Reference to an upstream evaluator plus an inversion flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    /// Position of the upstream evaluator in evaluation order
    source: usize,
    inverted: bool,
}

impl InputBinding {
    pub fn new(source: usize, inverted: bool) -> Self {
        Self { source, inverted }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Upstream output XOR inversion
    pub fn value(&self, outputs: &[bool]) -> bool {
        outputs.get(self.source).copied().unwrap_or(false) ^ self.inverted
    }
}

/// One evaluator input: false when unbound, OR of all bindings otherwise.
/// Variadic evaluators get a single-binding slot per source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSlot {
    bindings: Vec<InputBinding>,
}

impl InputSlot {
    pub fn new(bindings: Vec<InputBinding>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[InputBinding] {
        &self.bindings
    }

    pub fn value(&self, outputs: &[bool]) -> bool {
        self.bindings.iter().any(|binding| binding.value(outputs))
    }
}

/// An evaluator together with the block it runs for and its input wiring
pub struct EvaluatorNode {
    block: BlockId,
    evaluator: Box<dyn Evaluator>,
    inputs: Vec<InputSlot>,
}

impl EvaluatorNode {
    pub fn new(block: BlockId, evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            block,
            evaluator,
            inputs: Vec::new(),
        }
    }

    pub fn set_inputs(&mut self, inputs: Vec<InputSlot>) {
        self.inputs = inputs;
    }

    pub fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn output(&self) -> bool {
        self.evaluator.output()
    }
}

/// The wired evaluator set of one run, in evaluation order.
///
/// Outputs live in a flat table indexed by order position; a node reads the
/// table as it stands when its turn comes, so upstream nodes already carry the
/// current tick and feedback sources still carry the previous one.
pub struct Circuit {
    nodes: Vec<EvaluatorNode>,
    outputs: Vec<bool>,
    positions: HashMap<BlockId, usize>,
    signals: BTreeMap<BlockId, SignalHandle>,
    input_buffer: Vec<bool>,
}

impl std::fmt::Debug for Circuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Circuit")
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl Circuit {
    pub fn new(nodes: Vec<EvaluatorNode>) -> Self {
        let outputs = nodes.iter().map(|node| node.output()).collect();
        let positions = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.block.clone(), position))
            .collect();
        let signals = nodes
            .iter()
            .filter_map(|node| node.evaluator.signal().map(|handle| (node.block.clone(), handle)))
            .collect();

        Self {
            nodes,
            outputs,
            positions,
            signals,
            input_buffer: Vec::new(),
        }
    }

    /// Run every evaluator once in order, then advance the clock.
    ///
    /// A failing or panicking evaluator aborts the tick; the clock is not
    /// advanced and the circuit must not be stepped again.
    pub fn step(&mut self, clock: &mut Clock) -> Result<(), SimulationError> {
        let cycle = clock.cycle() + 1;

        for (position, node) in self.nodes.iter_mut().enumerate() {
            self.input_buffer.clear();
            self.input_buffer
                .extend(node.inputs.iter().map(|slot| slot.value(&self.outputs)));

            let inputs = &self.input_buffer;
            let evaluator = &mut node.evaluator;
            let result = panic::catch_unwind(AssertUnwindSafe(|| evaluator.run(inputs, clock)));

            let reason = match result {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(payload) => Some(format!("evaluator panicked: {}", panic_message(payload.as_ref()))),
            };
            if let Some(reason) = reason {
                return Err(SimulationError::TickFailure {
                    cycle,
                    block: node.block.clone(),
                    reason,
                });
            }

            self.outputs[position] = node.evaluator.output();
        }

        clock.tick();
        trace!("Cycle {} outputs {:?}", cycle, self.outputs);
        Ok(())
    }

    pub fn output(&self, block: &BlockId) -> Option<bool> {
        self.positions
            .get(block)
            .and_then(|&position| self.outputs.get(position).copied())
    }

    /// Current output of every block
    pub fn outputs(&self) -> BTreeMap<BlockId, bool> {
        self.nodes
            .iter()
            .zip(&self.outputs)
            .map(|(node, &value)| (node.block.clone(), value))
            .collect()
    }

    /// Set an externally controlled source; read at its next run
    pub fn set_signal(&self, block: &BlockId, value: bool) -> Result<(), SimulationError> {
        let handle = self
            .signals
            .get(block)
            .ok_or_else(|| SimulationError::UnknownSignal(block.clone()))?;
        handle.set(value);
        Ok(())
    }

    pub fn signals(&self) -> &BTreeMap<BlockId, SignalHandle> {
        &self.signals
    }

    pub fn node(&self, block: &BlockId) -> Option<&EvaluatorNode> {
        self.positions.get(block).map(|&position| &self.nodes[position])
    }

    pub fn nodes(&self) -> &[EvaluatorNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::gates::{And, Inverter};
    use crate::core::components::memory::{MemoryPriority, SetReset};
    use crate::core::components::signal::Signal;
    use crate::core::errors::EvaluatorError;
    use std::time::Duration;

    struct Exploding;

    impl Evaluator for Exploding {
        fn kind(&self) -> &'static str {
            "EXPLODING"
        }

        fn run(&mut self, _inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
            panic!("boom");
        }

        fn output(&self) -> bool {
            false
        }
    }

    fn node(id: &str, evaluator: Box<dyn Evaluator>, inputs: Vec<Vec<(usize, bool)>>) -> EvaluatorNode {
        let mut node = EvaluatorNode::new(BlockId::new(id), evaluator);
        node.set_inputs(
            inputs
                .into_iter()
                .map(|slot| {
                    InputSlot::new(
                        slot.into_iter()
                            .map(|(source, inverted)| InputBinding::new(source, inverted))
                            .collect(),
                    )
                })
                .collect(),
        );
        node
    }

    fn clock() -> Clock {
        Clock::new(Duration::from_millis(100))
    }

    #[test]
    fn input_slot_reads_false_when_unbound_and_or_when_multiple() {
        let outputs = [true, false];
        assert!(!InputSlot::default().value(&outputs));
        assert!(InputSlot::new(vec![InputBinding::new(1, false), InputBinding::new(0, false)]).value(&outputs));
        assert!(InputSlot::new(vec![InputBinding::new(1, true)]).value(&outputs));
        assert!(!InputSlot::new(vec![InputBinding::new(0, true)]).value(&outputs));
    }

    #[test]
    fn downstream_sees_current_tick_values() {
        let mut circuit = Circuit::new(vec![
            node("s", Box::new(Signal::new(true)), vec![]),
            node("not", Box::new(Inverter::new()), vec![vec![(0, false)]]),
        ]);
        let mut clock = clock();
        circuit.step(&mut clock).unwrap();
        assert_eq!(circuit.output(&BlockId::new("not")), Some(false));
        assert_eq!(clock.cycle(), 1);
    }

    #[test]
    fn feedback_reads_previous_tick_values() {
        // latch first, AND fed by the latch runs after it
        let mut circuit = Circuit::new(vec![
            node("s", Box::new(Signal::new(false)), vec![]),
            node("q", Box::new(SetReset::new(MemoryPriority::Reset)), vec![vec![(0, false)], vec![(2, true)]]),
            node("and", Box::new(And::new()), vec![vec![(1, false)]]),
        ]);
        let mut clock = clock();
        circuit.step(&mut clock).unwrap();
        // reset reads !and from before the tick (false) -> asserted, latch stays false
        assert_eq!(circuit.output(&BlockId::new("q")), Some(false));

        circuit.set_signal(&BlockId::new("s"), true).unwrap();
        circuit.step(&mut clock).unwrap();
        // set and reset both asserted, reset priority wins
        assert_eq!(circuit.output(&BlockId::new("q")), Some(false));
        assert_eq!(circuit.output(&BlockId::new("and")), Some(false));
    }

    #[test]
    fn evaluator_error_becomes_tick_failure() {
        let mut circuit = Circuit::new(vec![node("not", Box::new(Inverter::new()), vec![vec![], vec![]])]);
        let mut clock = clock();
        let err = circuit.step(&mut clock).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::TickFailure { cycle: 1, ref block, .. } if block == &BlockId::new("not")
        ));
        assert_eq!(clock.cycle(), 0, "failed tick does not advance the clock");
    }

    #[test]
    fn evaluator_panic_becomes_tick_failure() {
        let mut circuit = Circuit::new(vec![node("x", Box::new(Exploding), vec![])]);
        let err = circuit.step(&mut clock()).unwrap_err();
        match err {
            SimulationError::TickFailure { reason, .. } => assert!(reason.contains("boom")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn set_signal_rejects_non_signal_blocks() {
        let circuit = Circuit::new(vec![node("and", Box::new(And::new()), vec![])]);
        assert_eq!(
            circuit.set_signal(&BlockId::new("and"), true),
            Err(SimulationError::UnknownSignal(BlockId::new("and")))
        );
        assert!(circuit.signals().is_empty());
    }
}
