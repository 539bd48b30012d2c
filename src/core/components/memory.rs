use crate::core::components::kinds;
use crate::core::components::traits::{expect_arity, Evaluator};
use crate::core::errors::EvaluatorError;
use crate::core::execution::clock::Clock;

/// Which input wins when set and reset are asserted together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPriority {
    Set,
    Reset,
}

/// Set/reset latch. Inputs are `[set, reset]`.
#[derive(Debug, Clone)]
pub struct SetReset {
    priority: MemoryPriority,
    output: bool,
}

impl SetReset {
    pub fn new(priority: MemoryPriority) -> Self {
        Self {
            priority,
            output: false,
        }
    }

    pub fn priority(&self) -> MemoryPriority {
        self.priority
    }
}

impl Evaluator for SetReset {
    fn kind(&self) -> &'static str {
        match self.priority {
            MemoryPriority::Set => kinds::SR_SET,
            MemoryPriority::Reset => kinds::SR_RESET,
        }
    }

    fn run(&mut self, inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
        expect_arity(self.kind(), inputs, 2)?;
        self.output = match (inputs[0], inputs[1]) {
            (true, true) => self.priority == MemoryPriority::Set,
            (true, false) => true,
            (false, true) => false,
            (false, false) => self.output,
        };
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}
