//! Combinational evaluators: output depends only on current-tick inputs.

use crate::core::components::kinds;
use crate::core::components::traits::{expect_arity, Evaluator};
use crate::core::errors::EvaluatorError;
use crate::core::execution::clock::Clock;

/// Logical AND of all inputs, true with no inputs
#[derive(Debug, Clone, Default)]
pub struct And {
    output: bool,
}

impl And {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evaluator for And {
    fn kind(&self) -> &'static str {
        kinds::AND
    }

    fn variadic(&self) -> bool {
        true
    }

    fn run(&mut self, inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
        self.output = inputs.iter().all(|&value| value);
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}

/// Logical OR of all inputs, false with no inputs
#[derive(Debug, Clone, Default)]
pub struct Or {
    output: bool,
}

impl Or {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evaluator for Or {
    fn kind(&self) -> &'static str {
        kinds::OR
    }

    fn variadic(&self) -> bool {
        true
    }

    fn run(&mut self, inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
        self.output = inputs.iter().any(|&value| value);
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inverter {
    output: bool,
}

impl Inverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evaluator for Inverter {
    fn kind(&self) -> &'static str {
        kinds::INVERTER
    }

    fn run(&mut self, inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
        expect_arity(kinds::INVERTER, inputs, 1)?;
        self.output = !inputs[0];
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}

/// Transparent relay. The graph builder also sees through it.
#[derive(Debug, Clone, Default)]
pub struct Shortcut {
    output: bool,
}

impl Shortcut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evaluator for Shortcut {
    fn kind(&self) -> &'static str {
        kinds::SHORTCUT
    }

    fn run(&mut self, inputs: &[bool], _clock: &Clock) -> Result<(), EvaluatorError> {
        expect_arity(kinds::SHORTCUT, inputs, 1)?;
        self.output = inputs[0];
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn clock() -> Clock {
        Clock::new(Duration::from_millis(100))
    }

    fn run(evaluator: &mut dyn Evaluator, inputs: &[bool]) -> bool {
        evaluator.run(inputs, &clock()).unwrap();
        evaluator.output()
    }

    #[test]
    fn and_truth_table() {
        let mut and = And::new();
        assert!(run(&mut and, &[true, true]));
        assert!(!run(&mut and, &[true, false]));
        assert!(!run(&mut and, &[false, false]));
        assert!(run(&mut and, &[]), "empty AND is its identity");
    }

    #[test]
    fn or_truth_table() {
        let mut or = Or::new();
        assert!(run(&mut or, &[false, true]));
        assert!(!run(&mut or, &[false, false]));
        assert!(!run(&mut or, &[]), "empty OR is its identity");
    }

    #[test]
    fn inverter_and_shortcut() {
        assert!(run(&mut Inverter::new(), &[false]));
        assert!(!run(&mut Inverter::new(), &[true]));
        assert!(run(&mut Shortcut::new(), &[true]));
        assert!(!run(&mut Shortcut::new(), &[false]));
    }

    #[test]
    fn pure_gates_are_idempotent() {
        let gates: Vec<(Box<dyn Evaluator>, Vec<bool>)> = vec![
            (Box::new(And::new()), vec![true, false, true]),
            (Box::new(Or::new()), vec![false, true]),
            (Box::new(Inverter::new()), vec![true]),
            (Box::new(Shortcut::new()), vec![true]),
        ];
        for (mut gate, inputs) in gates {
            let first = run(gate.as_mut(), &inputs);
            for _ in 0..3 {
                assert_eq!(run(gate.as_mut(), &inputs), first, "{} changed", gate.kind());
            }
        }
    }

    #[test]
    fn only_and_or_are_variadic() {
        assert!(And::new().variadic());
        assert!(Or::new().variadic());
        assert!(!Inverter::new().variadic());
        assert!(!Shortcut::new().variadic());
    }

    #[test]
    fn fixed_arity_gates_reject_wrong_input_count() {
        let err = Inverter::new().run(&[true, false], &clock()).unwrap_err();
        assert_eq!(
            err,
            EvaluatorError::Arity {
                kind: kinds::INVERTER,
                expected: 1,
                found: 2
            }
        );
        assert!(Shortcut::new().run(&[], &clock()).is_err());
    }
}
