use crate::core::components::registry::EvaluatorRegistry;
use crate::core::errors::SimulationError;
use crate::core::execution::circuit::Circuit;
use crate::core::execution::clock::Clock;
use crate::core::execution::config::SimulationConfig;
use crate::core::graph::{GraphBuilder, GraphContext};
use crate::core::page::Page;
use crate::core::types::BlockId;
use log::{debug, info};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outputs published after a completed tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub run_id: Uuid,
    /// Clock cycle after the tick, 1 for the first tick of a run
    pub cycle: u64,
    pub outputs: BTreeMap<BlockId, bool>,
}

impl TickReport {
    pub fn output(&self, block: &BlockId) -> Option<bool> {
        self.outputs.get(block).copied()
    }
}

/// One simulation run: graph, wired evaluators and clock, stepped manually.
///
/// Everything is built fresh in `new` and dropped with the engine, so no state
/// survives from one run to the next.
pub struct SimulationEngine {
    run_id: Uuid,
    context: GraphContext,
    circuit: Circuit,
    clock: Clock,
}

impl SimulationEngine {
    pub fn new(
        page: &Page,
        registry: &EvaluatorRegistry,
        config: &SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let context = GraphBuilder::build(page)?;
        let circuit = registry.create(&context)?;
        let run_id = Uuid::new_v4();

        info!(
            "Run {} prepared for page '{}': {} blocks, {} signal sources",
            run_id,
            page.name,
            circuit.len(),
            circuit.signals().len()
        );

        Ok(Self {
            run_id,
            context,
            circuit,
            clock: Clock::new(config.resolution),
        })
    }

    /// Execute one tick and report the resulting outputs
    pub fn step(&mut self) -> Result<TickReport, SimulationError> {
        self.circuit.step(&mut self.clock)?;
        debug!("=== Run {} cycle {} ===", self.run_id, self.clock.cycle());
        Ok(self.report())
    }

    /// Execute `cycles` ticks, returning the final cycle
    pub fn run(&mut self, cycles: u64) -> Result<u64, SimulationError> {
        for _ in 0..cycles {
            self.circuit.step(&mut self.clock)?;
        }
        Ok(self.current_cycle())
    }

    pub fn report(&self) -> TickReport {
        TickReport {
            run_id: self.run_id,
            cycle: self.clock.cycle(),
            outputs: self.circuit.outputs(),
        }
    }

    pub fn current_cycle(&self) -> u64 {
        self.clock.cycle()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn output(&self, block: &BlockId) -> Option<bool> {
        self.circuit.output(block)
    }

    pub fn set_signal(&self, block: &BlockId, value: bool) -> Result<(), SimulationError> {
        self.circuit.set_signal(block, value)
    }
}
