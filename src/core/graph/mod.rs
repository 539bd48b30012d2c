//! Graph builder: turns a page into resolved connectivity and a block
//! evaluation order.

pub mod builder;
pub mod context;
pub mod execution_order;

pub use builder::GraphBuilder;
pub use context::{BlockEntry, Dependency, GraphContext};
pub use execution_order::{ExecutionOrderBuilder, OrderNode};
