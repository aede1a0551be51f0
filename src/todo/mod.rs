//! Date-partitioned to-do list and its JSON store.

pub mod list;
pub mod store;
