//! Background Tasks Module
//!
//! Tasks that run detached from the caller.
//!
//! # Tasks
//! - Async writes: delivers `put` batches in `WriteMode::Async`
//! - Store expiry: purges expired keys from the in-memory store at intervals

mod expiry;
mod writer;

pub use expiry::spawn_expiry_task;
pub use writer::spawn_write;
