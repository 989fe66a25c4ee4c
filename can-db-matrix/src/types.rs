//! Core types for the CAN database library
//!
//! This module defines the error taxonomy and the small enums shared between
//! the grammar and the model. Database files come from different tool vendors,
//! so most failures here are per-file: callers aggregating several files are
//! expected to log and continue rather than abort.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Errors that can occur while loading and building a database
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database file not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("Not a database file (expected .dbc extension): {0:?}")]
    WrongExtension(PathBuf),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid definition: {0}")]
    Build(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatabaseError {
    /// Construct a parse error for the given source line
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        DatabaseError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Byte order of a signal within the frame payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Big-endian (Motorola format), `@0` in the layout code
    BigEndian,
    /// Little-endian (Intel format), `@1` in the layout code
    LittleEndian,
}

/// Signedness of the raw signal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Unsigned integer, `+` in the layout code
    Unsigned,
    /// Signed integer (two's complement), `-` in the layout code
    Signed,
}

/// Multiplexing role of a signal
///
/// A message carries at most one `Multiplexor`; a `Multiplexed` signal is only
/// present in frames where the multiplexor equals its selector value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiplexRole {
    /// Plain signal, always present
    Normal,
    /// The selector signal (`M` marker)
    Multiplexor,
    /// Present only for the given selector value (`m<N>` marker)
    Multiplexed(u32),
}

impl fmt::Display for MultiplexRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiplexRole::Normal => write!(f, "normal"),
            MultiplexRole::Multiplexor => write!(f, "multiplexor"),
            MultiplexRole::Multiplexed(sel) => write!(f, "multiplexed({})", sel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplex_role_display() {
        assert_eq!(format!("{}", MultiplexRole::Normal), "normal");
        assert_eq!(format!("{}", MultiplexRole::Multiplexed(3)), "multiplexed(3)");
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = DatabaseError::parse(42, "unexpected token");
        assert_eq!(format!("{}", err), "Parse error at line 42: unexpected token");
    }
}
