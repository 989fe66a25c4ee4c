//! JSON export of the merged channel matrix
//!
//! Produces the nested mapping the downstream collaborators consume:
//! channel -> message id -> message metadata with its signal map. The hex id
//! is derived here from the numeric id; it is never stored in the model.

use can_db_matrix::{ChannelMatrix, Message, MultiplexRole, Signal, ValueDescription};
use can_db_matrix::{ByteOrder, ValueType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct SignalExport {
    multiplex: MultiplexRole,
    start_bit: u16,
    length_bit: u16,
    byte_order: ByteOrder,
    value_type: ValueType,
    factor: f64,
    offset: f64,
    value_min: f64,
    value_max: f64,
    unit: String,
    value_table: Option<Vec<ValueDescription>>,
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageExport {
    id_hex: String,
    name: String,
    dlc: u16,
    comment: Option<String>,
    signals: BTreeMap<String, SignalExport>,
}

impl From<&Signal> for SignalExport {
    fn from(signal: &Signal) -> Self {
        Self {
            multiplex: signal.multiplex,
            start_bit: signal.start_bit,
            length_bit: signal.length_bit,
            byte_order: signal.byte_order,
            value_type: signal.value_type,
            factor: signal.factor,
            offset: signal.offset,
            value_min: signal.value_min,
            value_max: signal.value_max,
            unit: signal.unit.clone(),
            value_table: signal.value_table.clone(),
            comment: signal.comment.clone(),
        }
    }
}

impl From<&Message> for MessageExport {
    fn from(message: &Message) -> Self {
        Self {
            id_hex: message.id_hex(),
            name: message.name.clone(),
            dlc: message.dlc,
            comment: message.comment.clone(),
            signals: message
                .signals
                .iter()
                .map(|(name, signal)| (name.clone(), SignalExport::from(signal)))
                .collect(),
        }
    }
}

/// Render the matrix as the channel -> message id -> metadata mapping
pub fn channel_matrix_export(matrix: &ChannelMatrix) -> serde_json::Value {
    let mut channels: BTreeMap<String, BTreeMap<String, MessageExport>> = BTreeMap::new();
    for (key, index) in matrix.channels() {
        let messages = index
            .messages()
            .map(|message| (message.id_dec.to_string(), MessageExport::from(message)))
            .collect();
        channels.insert(key.to_string(), messages);
    }
    serde_json::to_value(channels).expect("matrix export is always valid JSON")
}
