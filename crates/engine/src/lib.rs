pub mod column;
pub mod edit;
pub mod error;
pub mod events;
pub mod filter;
pub mod grid;
pub mod group;
pub mod pipeline;
pub mod reconcile;
pub mod row;
pub mod selection;
pub mod sort;
pub mod store;
pub mod value;
pub mod viewport;

#[cfg(test)]
pub mod harness;
