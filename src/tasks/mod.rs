//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries nobody has read, when enabled

mod cleanup;

pub use cleanup::spawn_sweep_task;
