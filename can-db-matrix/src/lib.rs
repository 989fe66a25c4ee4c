//! CAN Database Matrix Library
//!
//! Parses vehicle bus database files (DBC text interchange format) into a
//! validated, queryable in-memory model, aggregates the models per logical
//! bus channel, and classifies an externally supplied signal worklist.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on the model:
//! - A statement grammar turns one file's text into classified statements
//! - A two-pass builder links messages, signals, comments and value tables
//! - A `Database` indexes one file; a `ChannelMatrix` merges file stacks
//!   per channel with last-file-wins semantics
//! - The resolver splits a wanted-signal worklist into categorical and
//!   continuous sequences around an identity key
//!
//! The library does NOT:
//! - Decode raw bus frames into physical values
//! - Compute statistics or detect outliers
//! - Render charts or assemble reports
//!
//! Those belong to the downstream collaborators that consume this model.
//!
//! # Example Usage
//!
//! ```no_run
//! use can_db_matrix::{ChannelMatrix, WantedSignal, classify};
//! use std::collections::BTreeMap;
//! use std::path::{Path, PathBuf};
//!
//! let mut channels = BTreeMap::new();
//! channels.insert("Ch3".to_string(), vec![PathBuf::from("powertrain.dbc")]);
//! channels.insert("Ch4".to_string(), vec![PathBuf::from("camera.dbc")]);
//!
//! let matrix = ChannelMatrix::build(Path::new("/databases"), &channels);
//!
//! let worklist = vec![
//!     WantedSignal { name: "FrontCameraID".to_string(), categorical: false },
//!     WantedSignal { name: "EngineSpeed".to_string(), categorical: false },
//! ];
//! let plan = classify(&worklist, "Cam_id");
//! for name in &plan.categorical {
//!     println!("{} owned by {:?}", name, matrix.owners(name));
//! }
//! ```

// Public modules
pub mod matrix;
pub mod model;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use matrix::{ChannelIndex, ChannelMatrix};
pub use model::{Database, Message, Signal, ValueDescription};
pub use resolver::{classify, identity_key, locate, SignalPlan, WantedSignal};
pub use types::{ByteOrder, DatabaseError, MultiplexRole, Result, ValueType};

// Internal modules (not exposed in public API)
mod grammar;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty file yields an empty database
        let db = Database::parse("").unwrap();
        assert!(db.is_empty());
        assert_eq!(db.version(), None);
    }
}
