use crate::core::components::kinds;
use crate::core::components::traits::Evaluator;
use crate::core::errors::EvaluatorError;
use crate::core::execution::clock::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to a signal source value.
///
/// The host writes between ticks, the running circuit reads during a tick.
#[derive(Debug, Clone, Default)]
pub struct SignalHandle {
    value: Arc<AtomicBool>,
}

impl SignalHandle {
    pub fn new(initial: bool) -> Self {
        Self {
            value: Arc::new(AtomicBool::new(initial)),
        }
    }

    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    pub fn toggle(&self) -> bool {
        !self.value.fetch_xor(true, Ordering::AcqRel)
    }
}

/// Externally controlled source with no inputs
#[derive(Debug, Clone)]
pub struct Signal {
    handle: SignalHandle,
    output: bool,
}

impl Signal {
    pub fn new(initial: bool) -> Self {
        Self {
            handle: SignalHandle::new(initial),
            output: initial,
        }
    }

    pub fn handle(&self) -> SignalHandle {
        self.handle.clone()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Evaluator for Signal {
    fn kind(&self) -> &'static str {
        kinds::SIGNAL
    }

    fn run(&mut self, _inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
        self.output = self.handle.get();
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }

    fn signal(&self) -> Option<SignalHandle> {
        Some(self.handle.clone())
    }
}
