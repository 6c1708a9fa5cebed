//! Process engine adapters implementing the domain ports.

pub mod in_memory;
#[cfg(feature = "engine-rest")]
pub mod rest;
