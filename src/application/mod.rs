//! Application layer driving one workflow run.
//!
//! This module defines the `WorkflowApplication` which loads configuration,
//! builds the engine through its port, deploys the process resource, starts
//! a single instance and releases the engine, in that order.

pub mod driver;
