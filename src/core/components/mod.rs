pub mod gates;
pub mod kinds;
pub mod memory;
pub mod registry;
pub mod signal;
pub mod timers;
pub mod traits;

// Re-export commonly used types
pub use gates::{And, Inverter, Or, Shortcut};
pub use memory::{MemoryPriority, SetReset};
pub use registry::{EvaluatorFactory, EvaluatorRegistry};
pub use signal::{Signal, SignalHandle};
pub use timers::{ticks_for, TickRounding, TimerOff, TimerOn, TimerPulse, TIMER_TICK_ROUNDING};
pub use traits::Evaluator;
