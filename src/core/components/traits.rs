use crate::core::components::signal::SignalHandle;
use crate::core::errors::EvaluatorError;
use crate::core::execution::clock::Clock;

/// Stateful boolean logic unit, one per block for the lifetime of a run.
///
/// `run` receives the effective value of every input slot (upstream output
/// XOR inversion, already resolved) in pin declaration order and updates the
/// evaluator's output. Evaluators never see each other directly; the circuit
/// owns the bindings.
pub trait Evaluator: Send {
    /// Kind tag of the variant, used in diagnostics
    fn kind(&self) -> &'static str;

    fn run(&mut self, inputs: &[bool], clock: &Clock) -> Result<(), EvaluatorError>;

    fn output(&self) -> bool;

    /// Variadic evaluators receive one input per resolved source, so several
    /// wires on one pin count as several inputs. Fixed-arity evaluators get
    /// one input per pin, multiple sources on a pin combined by OR.
    fn variadic(&self) -> bool {
        false
    }

    /// Externally settable source handle, only for SIGNAL-like evaluators
    fn signal(&self) -> Option<SignalHandle> {
        None
    }
}

/// Check the number of inputs of a fixed-arity evaluator
pub(crate) fn expect_arity(kind: &'static str, inputs: &[bool], expected: usize) -> Result<(), EvaluatorError> {
    if inputs.len() != expected {
        return Err(EvaluatorError::Arity {
            kind,
            expected,
            found: inputs.len(),
        });
    }
    Ok(())
}
