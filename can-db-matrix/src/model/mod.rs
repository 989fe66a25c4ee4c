//! Database model and its builder
//!
//! The grammar produces classified statements; the builder reduces them into
//! the per-file `Database` of messages and signals.

pub(crate) mod builder;
pub mod database;

// Re-export key types for convenience
pub use database::{
    Database, Message, Signal, ValueDescription, INDEPENDENT_SIG_MSG, RESERVED_FRAME_ID,
};
