//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired entries from every cache instance
//! - Cache Warming: Keeps registered keys populated

mod cleanup;
mod warming;

pub use cleanup::{run_cleanup, spawn_cleanup_task};
pub use warming::spawn_warming_tasks;
