//! Two-pass reduction of the statement stream into a `Database`
//!
//! Pass 1 buckets the independently-declared sections (comments, value
//! tables, declared value types, version, ECU list) by their reference keys.
//! Pass 2 walks only the message statements, builds each message and its
//! signals, and attaches the bucketed data by `(message id, signal name)`
//! lookup. The input statements are not mutated.

use crate::grammar::{CommentStmt, Statement};
use crate::model::database::{
    Database, Message, Signal, ValueDescription, INDEPENDENT_SIG_MSG, RESERVED_FRAME_ID,
};
use crate::types::{MultiplexRole, Result, ValueType};
use std::collections::HashMap;

pub(crate) fn build(statements: &[Statement]) -> Result<Database> {
    let mut version: Option<String> = None;
    let mut ecus: Vec<String> = Vec::new();
    // Message comments keep the first declaration; signal-level buckets keep
    // the last, matching how repeated declarations shadow each other in
    // multi-revision exports.
    let mut msg_comments: HashMap<u32, String> = HashMap::new();
    let mut sig_comments: HashMap<(u32, String), String> = HashMap::new();
    let mut value_tables: HashMap<(u32, String), Vec<(i64, String)>> = HashMap::new();
    let mut declared_types: HashMap<(u32, String), i64> = HashMap::new();

    for statement in statements {
        match statement {
            Statement::Version(v) => version = Some(v.clone()),
            Statement::Ecus(list) => {
                if !list.is_empty() {
                    ecus = list.clone();
                }
            }
            Statement::Comment(CommentStmt::Message { message_id, text }) => {
                msg_comments
                    .entry(*message_id)
                    .or_insert_with(|| text.clone());
            }
            Statement::Comment(CommentStmt::Signal {
                message_id,
                signal,
                text,
            }) => {
                sig_comments.insert((*message_id, signal.clone()), text.clone());
            }
            Statement::SignalValueTable {
                message_id,
                signal,
                entries,
            } => {
                value_tables.insert((*message_id, signal.clone()), entries.clone());
            }
            Statement::SignalValueType {
                message_id,
                signal,
                declared,
            } => {
                declared_types.insert((*message_id, signal.clone()), *declared);
            }
            // Node/file comments, named value tables, attribute machinery and
            // the symbol/bit-timing stubs carry nothing the model keeps.
            _ => {}
        }
    }

    let mut messages: HashMap<u32, Message> = HashMap::new();
    for statement in statements {
        let Statement::Message(stmt) = statement else {
            continue;
        };
        if stmt.id == RESERVED_FRAME_ID {
            log::debug!(
                "skipping reserved frame id 0x{:x} (`{}`)",
                stmt.id,
                stmt.name
            );
            continue;
        }
        if stmt.name == INDEPENDENT_SIG_MSG {
            log::debug!("skipping independent-signal placeholder message");
            continue;
        }

        let mut signals: HashMap<String, Signal> = HashMap::with_capacity(stmt.signals.len());
        let mut selectors: HashMap<u32, String> = HashMap::new();
        for sig in &stmt.signals {
            if let MultiplexRole::Multiplexed(selector) = sig.multiplex {
                if let Some(previous) = selectors.insert(selector, sig.name.clone()) {
                    log::warn!(
                        "message `{}` (0x{:x}): selector {} used by both `{}` and `{}`",
                        stmt.name,
                        stmt.id,
                        selector,
                        previous,
                        sig.name
                    );
                }
            }

            let key = (stmt.id, sig.name.clone());
            if let Some(declared) = declared_types.get(&key) {
                let inferred: i64 = match sig.value_type {
                    ValueType::Unsigned => 0,
                    ValueType::Signed => 1,
                };
                if *declared != inferred {
                    log::debug!(
                        "`{}`.`{}`: declared value type {} differs from layout sign, not applied",
                        stmt.name,
                        sig.name,
                        declared
                    );
                }
            }

            let signal = Signal {
                name: sig.name.clone(),
                multiplex: sig.multiplex,
                start_bit: sig.start_bit,
                length_bit: sig.length_bit,
                byte_order: sig.byte_order,
                value_type: sig.value_type,
                factor: sig.factor,
                offset: sig.offset,
                value_min: sig.value_min,
                value_max: sig.value_max,
                unit: sig.unit.clone(),
                receivers: sig.receivers.clone(),
                value_table: value_tables.get(&key).map(|entries| {
                    entries
                        .iter()
                        .map(|(raw, label)| ValueDescription {
                            raw: *raw,
                            label: label.clone(),
                        })
                        .collect()
                }),
                comment: sig_comments.get(&key).cloned(),
            };
            if signals.insert(sig.name.clone(), signal).is_some() {
                log::warn!(
                    "message `{}` (0x{:x}): signal `{}` redefined, later definition wins",
                    stmt.name,
                    stmt.id,
                    sig.name
                );
            }
        }

        let message = Message {
            id_dec: stmt.id,
            name: stmt.name.clone(),
            dlc: stmt.dlc,
            transmitter: stmt.transmitter.clone(),
            comment: msg_comments.get(&stmt.id).cloned(),
            signals,
        };
        if let Some(previous) = messages.insert(stmt.id, message) {
            log::warn!(
                "duplicate message id 0x{:x}: `{}` shadowed by later definition",
                stmt.id,
                previous.name
            );
        }
    }

    Ok(Database::from_parts(version, ecus, messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ByteOrder;

    const FIXTURE: &str = r#"
VERSION "7.3"

NS_ :
    NS_DESC_
    CM_

BS_:

BU_: CameraEcu Gateway

BO_ 291 EngineData: 8 Gateway
 SG_ EngineSpeed : 0|16@1+ (0.25,0) [0|8000] "rpm" CameraEcu
 SG_ Mode M : 16|8@1+ (1,0) [0|3] "" CameraEcu
 SG_ LaneOffset m3 : 24|12@0- (0.01,-20.5) [-20.5|20.5] "m" CameraEcu

BO_ 512 CameraStatus: 8 CameraEcu
 SG_ Mode : 0|8@1+ (1,0) [0|7] "" Gateway

BO_ 3221225472 VECTOR__INDEPENDENT_SIG_MSG: 0 Vector__XXX
 SG_ Orphan : 0|8@1+ (1,0) [0|255] "" Vector__XXX

CM_ BO_ 291 "engine frame";
CM_ SG_ 291 Mode "drive mode selector";
CM_ SG_ 512 Mode "camera state";
VAL_ 291 Mode 2 "Sport" 0 "Eco" 1 "Comfort";
SIG_VALTYPE_ 291 EngineSpeed : 1;
"#;

    fn build_fixture() -> Database {
        let statements = crate::grammar::parse(FIXTURE).unwrap();
        build(&statements).unwrap()
    }

    #[test]
    fn test_fixture_round_trip() {
        let db = build_fixture();
        assert_eq!(db.version(), Some("7.3"));
        assert_eq!(db.ecus(), ["CameraEcu".to_string(), "Gateway".to_string()]);

        let engine = db.message_by_id(291).unwrap();
        assert_eq!(engine.name, "EngineData");
        assert_eq!(engine.dlc, 8);
        assert_eq!(engine.transmitter, "Gateway");
        assert_eq!(engine.comment.as_deref(), Some("engine frame"));

        let speed = engine.signal("EngineSpeed").unwrap();
        assert_eq!(speed.multiplex, MultiplexRole::Normal);
        assert_eq!(speed.factor, 0.25);
        assert_eq!(speed.unit, "rpm");
        // Declared value type is recorded but never overrides the layout sign.
        assert_eq!(speed.value_type, ValueType::Unsigned);

        assert_eq!(
            engine.signal("Mode").unwrap().multiplex,
            MultiplexRole::Multiplexor
        );
        let lane = engine.signal("LaneOffset").unwrap();
        assert_eq!(lane.multiplex, MultiplexRole::Multiplexed(3));
        assert_eq!(lane.byte_order, ByteOrder::BigEndian);
        assert_eq!(lane.value_type, ValueType::Signed);
    }

    #[test]
    fn test_sentinel_message_is_excluded() {
        let db = build_fixture();
        assert!(db.message_by_id(RESERVED_FRAME_ID).is_none());
        assert_eq!(db.message_count(), 2);
    }

    #[test]
    fn test_attachment_keys_on_message_and_signal() {
        let db = build_fixture();
        // Both messages declare a `Mode` signal; each gets its own comment.
        let engine_mode = db.message_by_id(291).unwrap().signal("Mode").unwrap();
        let camera_mode = db.message_by_id(512).unwrap().signal("Mode").unwrap();
        assert_eq!(engine_mode.comment.as_deref(), Some("drive mode selector"));
        assert_eq!(camera_mode.comment.as_deref(), Some("camera state"));

        // The value table lands on 291's Mode only, declaration order kept.
        let table = engine_mode.value_table.as_ref().unwrap();
        assert_eq!(
            table
                .iter()
                .map(|v| (v.raw, v.label.as_str()))
                .collect::<Vec<_>>(),
            vec![(2, "Sport"), (0, "Eco"), (1, "Comfort")]
        );
        assert!(camera_mode.value_table.is_none());
    }

    #[test]
    fn test_duplicate_definitions_later_wins() {
        let text = r#"
BU_: E
BO_ 100 FirstName: 8 E
 SG_ S : 0|8@1+ (1,0) [0|255] "" E
BO_ 100 SecondName: 8 E
 SG_ S : 0|8@1+ (1,0) [0|255] "" E
 SG_ S : 8|8@1+ (2,0) [0|510] "" E
"#;
        let statements = crate::grammar::parse(text).unwrap();
        let db = build(&statements).unwrap();
        let message = db.message_by_id(100).unwrap();
        assert_eq!(message.name, "SecondName");
        assert_eq!(message.signals.len(), 1);
        assert_eq!(message.signal("S").unwrap().factor, 2.0);
    }

    #[test]
    fn test_message_comment_first_declaration_wins() {
        let text = r#"
BO_ 7 M: 8 E
CM_ BO_ 7 "first";
CM_ BO_ 7 "second";
"#;
        let statements = crate::grammar::parse(text).unwrap();
        let db = build(&statements).unwrap();
        assert_eq!(
            db.message_by_id(7).unwrap().comment.as_deref(),
            Some("first")
        );
    }
}
