//! The per-file database model
//!
//! Plain immutable value records: messages own their signals, comments and
//! value tables are attached by `(message id, signal name)` lookup at build
//! time. No back-pointers, no interior mutability; a database is built once
//! per file and replaced wholesale when the source file changes.

use crate::types::{ByteOrder, DatabaseError, MultiplexRole, Result, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Reserved frame id used by vendor tools as a non-payload marker. Messages
/// with this id carry no usable signal layout and are excluded.
pub const RESERVED_FRAME_ID: u32 = 0xC000_0000;

/// Placeholder message that collects signals not assigned to any real frame;
/// excluded like the reserved id.
pub const INDEPENDENT_SIG_MSG: &str = "VECTOR__INDEPENDENT_SIG_MSG";

/// One entry of an enumerated signal's value table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDescription {
    /// Raw integer value on the bus
    pub raw: i64,
    /// Human-readable label
    pub label: String,
}

/// One bit-field within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name, unique within its owning message
    pub name: String,
    /// Multiplexing role
    pub multiplex: MultiplexRole,
    /// Start bit within the frame payload
    pub start_bit: u16,
    /// Width in bits
    pub length_bit: u16,
    /// Byte order
    pub byte_order: ByteOrder,
    /// Signedness of the raw value
    pub value_type: ValueType,
    /// physical = raw * factor + offset
    pub factor: f64,
    /// physical = raw * factor + offset
    pub offset: f64,
    /// Minimum physical value
    pub value_min: f64,
    /// Maximum physical value
    pub value_max: f64,
    /// Engineering unit, may be empty
    pub unit: String,
    /// Receiver ECU names
    pub receivers: Vec<String>,
    /// Ordered raw-to-label mapping, present only for enumerated signals
    pub value_table: Option<Vec<ValueDescription>>,
    /// Signal comment from a `CM_ SG_` statement
    pub comment: Option<String>,
}

impl Signal {
    /// True if the signal has an enumeration table
    pub fn is_enumerated(&self) -> bool {
        self.value_table.is_some()
    }
}

/// One frame definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Frame id; may carry the extended-frame marker bit
    pub id_dec: u32,
    /// Message name
    pub name: String,
    /// Payload length in bytes
    pub dlc: u16,
    /// Transmitter ECU name, may be the `Vector__XXX` placeholder
    pub transmitter: String,
    /// Message comment from a `CM_ BO_` statement
    pub comment: Option<String>,
    /// Signals keyed by name
    pub signals: HashMap<String, Signal>,
}

impl Message {
    /// Hex form of the frame id, always derived from `id_dec`
    pub fn id_hex(&self) -> String {
        format!("{:#x}", self.id_dec)
    }

    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }
}

/// The finished model of one database file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Database {
    version: Option<String>,
    ecus: Vec<String>,
    messages: HashMap<u32, Message>,
    /// id_hex string -> id_dec, always recomputed on construction
    #[serde(skip)]
    hex_index: HashMap<String, u32>,
}

impl Database {
    /// Assemble a database from builder output. The hex index is always
    /// recomputed here; it is never stored independently of the ids.
    pub(crate) fn from_parts(
        version: Option<String>,
        ecus: Vec<String>,
        messages: HashMap<u32, Message>,
    ) -> Self {
        let hex_index = messages
            .values()
            .map(|message| (message.id_hex(), message.id_dec))
            .collect();
        Self {
            version,
            ecus,
            messages,
            hex_index,
        }
    }

    /// Parse database file content into a model
    pub fn parse(text: &str) -> Result<Self> {
        let statements = crate::grammar::parse(text)?;
        crate::model::builder::build(&statements)
    }

    /// Load a database file from disk.
    ///
    /// Fails with `FileNotFound` for a missing path and `WrongExtension` for
    /// anything not ending in `.dbc` (no parse is attempted in that case).
    /// File bytes are replacement-decoded, since vendor exports are not
    /// always valid UTF-8.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DatabaseError::FileNotFound(path.to_path_buf()));
        }
        let is_dbc = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dbc"));
        if !is_dbc {
            return Err(DatabaseError::WrongExtension(path.to_path_buf()));
        }

        log::info!("Loading database file: {:?}", path);
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let database = Self::parse(&text)?;
        log::info!(
            "Parsed {} messages ({} signals) from {:?}",
            database.message_count(),
            database.signal_count(),
            path
        );
        Ok(database)
    }

    /// Version string from the `VERSION` statement, if present
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// ECU names from the `BU_` statement, in declaration order
    pub fn ecus(&self) -> &[String] {
        &self.ecus
    }

    /// All messages, in no particular order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Look up a message by numeric id
    pub fn message_by_id(&self, id: u32) -> Option<&Message> {
        self.messages.get(&id)
    }

    /// Look up a message by its hex id string (`0x123` form)
    pub fn message_by_hex(&self, id_hex: &str) -> Option<&Message> {
        self.hex_index
            .get(id_hex)
            .and_then(|id| self.messages.get(id))
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn signal_count(&self) -> usize {
        self.messages
            .values()
            .map(|message| message.signals.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message(id: u32, name: &str) -> Message {
        Message {
            id_dec: id,
            name: name.to_string(),
            dlc: 8,
            transmitter: "ECU1".to_string(),
            comment: None,
            signals: HashMap::new(),
        }
    }

    #[test]
    fn test_id_hex_is_derived() {
        let message = sample_message(2566840818, "ObjFrame");
        assert_eq!(message.id_hex(), "0x98fe42f2");
        assert_eq!(sample_message(291, "M").id_hex(), "0x123");
    }

    #[test]
    fn test_hex_index_round_trip() {
        let mut messages = HashMap::new();
        messages.insert(291, sample_message(291, "EngineData"));
        messages.insert(512, sample_message(512, "BatteryStatus"));
        let db = Database::from_parts(Some("1.0".to_string()), vec![], messages);

        assert_eq!(db.message_by_id(291).unwrap().name, "EngineData");
        assert_eq!(db.message_by_hex("0x200").unwrap().name, "BatteryStatus");
        assert!(db.message_by_hex("0x999").is_none());
        assert_eq!(db.message_count(), 2);
    }

    #[test]
    fn test_load_rejects_missing_and_wrong_extension() {
        let missing = Path::new("/nonexistent/powertrain.dbc");
        assert!(matches!(
            Database::load(missing),
            Err(DatabaseError::FileNotFound(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "BO_ 1 M: 8 E\n").unwrap();
        assert!(matches!(
            Database::load(&txt),
            Err(DatabaseError::WrongExtension(_))
        ));
    }
}
