pub mod circuit;
pub mod clock;
pub mod config;
pub mod driver;
pub mod simulation_engine;

// Re-export commonly used types
pub use circuit::{Circuit, EvaluatorNode, InputBinding, InputSlot};
pub use clock::Clock;
pub use config::SimulationConfig;
pub use driver::{DriverState, SimulationDriver, TickObserver};
pub use simulation_engine::{SimulationEngine, TickReport};
