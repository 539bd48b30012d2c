use crate::core::components::gates::{And, Inverter, Or, Shortcut};
use crate::core::components::kinds;
use crate::core::components::memory::{MemoryPriority, SetReset};
use crate::core::components::signal::Signal;
use crate::core::components::timers::{TimerOff, TimerOn, TimerPulse};
use crate::core::components::traits::Evaluator;
use crate::core::errors::SimulationError;
use crate::core::execution::circuit::{Circuit, EvaluatorNode, InputBinding, InputSlot};
use crate::core::execution::config::SimulationConfig;
use crate::core::graph::GraphContext;
use crate::core::types::BlockId;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Constructor of a fresh evaluator for one block
pub type EvaluatorFactory = Arc<dyn Fn() -> Box<dyn Evaluator> + Send + Sync>;

/// Maps block kind tags to evaluator constructors.
///
/// Built once by the host and passed explicitly; there is no global table.
#[derive(Clone, Default)]
pub struct EvaluatorRegistry {
    factories: BTreeMap<String, EvaluatorFactory>,
}

impl EvaluatorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in kind set, timers using the configured delay
    pub fn with_builtins(config: &SimulationConfig) -> Self {
        let mut registry = Self::new();
        let timer_duration = config.timer_duration;

        registry.register(kinds::AND, || Box::new(And::new()));
        registry.register(kinds::INVERTER, || Box::new(Inverter::new()));
        registry.register(kinds::OR, || Box::new(Or::new()));

        registry.register(kinds::SR_RESET, || Box::new(SetReset::new(MemoryPriority::Reset)));
        registry.register(kinds::SR_RESET_V, || Box::new(SetReset::new(MemoryPriority::Reset)));
        registry.register(kinds::SR_SET, || Box::new(SetReset::new(MemoryPriority::Set)));
        registry.register(kinds::SR_SET_V, || Box::new(SetReset::new(MemoryPriority::Set)));

        registry.register(kinds::SHORTCUT, || Box::new(Shortcut::new()));
        registry.register(kinds::SIGNAL, || Box::new(Signal::new(false)));

        registry.register(kinds::TIMER_OFF, move || Box::new(TimerOff::new(timer_duration)));
        registry.register(kinds::TIMER_ON, move || Box::new(TimerOn::new(timer_duration)));
        registry.register(kinds::TIMER_PULSE, move || Box::new(TimerPulse::new(timer_duration)));

        registry
    }

    /// Register a factory for `kind`, replacing and returning any previous one
    pub fn register<F>(&mut self, kind: &str, factory: F) -> Option<EvaluatorFactory>
    where
        F: Fn() -> Box<dyn Evaluator> + Send + Sync + 'static,
    {
        self.factories.insert(kind.to_string(), Arc::new(factory))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind tags in sorted order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|kind| kind.as_str())
    }

    /// Instantiate a fresh evaluator for `kind`
    pub fn instantiate(&self, kind: &str) -> Option<Box<dyn Evaluator>> {
        self.factories.get(kind).map(|factory| factory())
    }

    /// Instantiate and wire one evaluator per block of `context`.
    ///
    /// Fixed-arity evaluators get one input slot per input pin. Variadic ones
    /// get one slot per resolved source, so every wire counts as an input.
    ///
    /// All or nothing: on an unsupported kind nothing built so far escapes.
    pub fn create(&self, context: &GraphContext) -> Result<Circuit, SimulationError> {
        let mut evaluators: Vec<(BlockId, Box<dyn Evaluator>)> = Vec::with_capacity(context.ordered_blocks.len());
        for block_id in &context.ordered_blocks {
            let kind = context
                .block(block_id)
                .map(|entry| entry.kind.as_str())
                .unwrap_or_default();
            let evaluator = self
                .instantiate(kind)
                .ok_or_else(|| SimulationError::UnsupportedKind {
                    block: block_id.clone(),
                    kind: kind.to_string(),
                })?;
            evaluators.push((block_id.clone(), evaluator));
        }

        let positions: HashMap<&BlockId, usize> = context
            .ordered_blocks
            .iter()
            .enumerate()
            .map(|(position, id)| (id, position))
            .collect();

        let mut nodes = Vec::with_capacity(evaluators.len());
        for (block_id, evaluator) in evaluators {
            let variadic = evaluator.variadic();
            let mut inputs = Vec::new();
            let pins = context
                .block(&block_id)
                .map(|entry| entry.inputs.as_slice())
                .unwrap_or_default();
            for pin in pins {
                let bindings: Vec<InputBinding> = context
                    .dependencies_of(pin)
                    .into_iter()
                    .flatten()
                    .filter_map(|dep| {
                        let owner = context.owner(&dep.source)?;
                        let source = *positions.get(owner)?;
                        Some(InputBinding::new(source, dep.inverted))
                    })
                    .collect();

                // An unbound pin still occupies one slot reading false.
                if variadic && !bindings.is_empty() {
                    inputs.extend(bindings.into_iter().map(|binding| InputSlot::new(vec![binding])));
                } else {
                    inputs.push(InputSlot::new(bindings));
                }
            }

            let mut node = EvaluatorNode::new(block_id, evaluator);
            node.set_inputs(inputs);
            nodes.push(node);
        }

        debug!("Wired {} evaluators", nodes.len());
        Ok(Circuit::new(nodes))
    }
}

impl std::fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
