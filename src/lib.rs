pub mod core;

// Re-export commonly used types
pub use crate::core::builder::PageBuilder;
pub use crate::core::components::{Evaluator, EvaluatorRegistry, SignalHandle};
pub use crate::core::errors::{EvaluatorError, GraphError, SimulationError};
pub use crate::core::execution::{
    Clock, DriverState, SimulationConfig, SimulationDriver, SimulationEngine, TickObserver, TickReport,
};
pub use crate::core::graph::{GraphBuilder, GraphContext};
pub use crate::core::page::{Block, Page, Pin, Wire};
pub use crate::core::types::{BlockId, PinDirection, PinId, WireId};
