pub mod builder;
pub mod components;
pub mod errors;
pub mod execution;
pub mod graph;
pub mod page;
pub mod types;
