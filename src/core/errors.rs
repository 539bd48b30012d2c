use crate::core::types::{BlockId, PinId, WireId};
use thiserror::Error;

/// A page that cannot be resolved into a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("free pin '{0}' has no wires, cannot infer its direction")]
    UndirectedFreePin(PinId),
    #[error("pin '{pin}' of block '{block}' has no direction")]
    UndirectedBlockPin { block: BlockId, pin: PinId },
    #[error("pin '{pin}' is declared in block '{block}' but owned by '{owner}'")]
    OwnerMismatch {
        block: BlockId,
        pin: PinId,
        owner: BlockId,
    },
    #[error("wire '{wire}' references unknown pin '{pin}'")]
    UnknownPin { wire: WireId, pin: PinId },
    #[error("duplicate block id '{0}'")]
    DuplicateBlock(BlockId),
    #[error("duplicate pin id '{0}'")]
    DuplicatePin(PinId),
    #[error("block '{block}' has no pin named '{pin}'")]
    UnknownBlockPin { block: BlockId, pin: String },
}

/// Fault raised by a single evaluator while running
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluatorError {
    #[error("{kind} expects {expected} input(s), found {found}")]
    Arity {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("block '{block}' has unsupported kind '{kind}'")]
    UnsupportedKind { block: BlockId, kind: String },
    #[error("malformed graph: {0}")]
    MalformedGraph(#[from] GraphError),
    #[error("tick {cycle} failed in block '{block}': {reason}")]
    TickFailure {
        cycle: u64,
        block: BlockId,
        reason: String,
    },
    #[error("simulation task ended abnormally: {0}")]
    TaskFailed(String),
    #[error("simulation is already running")]
    AlreadyRunning,
    #[error("block '{0}' is not a signal source of the running simulation")]
    UnknownSignal(BlockId),
    #[error("tick resolution must be non-zero")]
    InvalidResolution,
    #[error("no tokio runtime available to drive the simulation")]
    NoRuntime,
}
