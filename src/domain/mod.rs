//! Domain types and the ports through which the application reaches the
//! process engine.

pub mod message;
pub mod ports;
pub mod process;
