//! Read-only probes of the local host.
//!
//! The `read_*`/`inspect_*` functions block (they sleep through a CPU sampling
//! window); the async `collect_*` wrappers move them to tokio's blocking pool.

pub mod cron;
pub mod host;
pub mod processes;
pub mod resources;
