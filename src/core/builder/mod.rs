pub mod page_builder;

pub use page_builder::PageBuilder;
