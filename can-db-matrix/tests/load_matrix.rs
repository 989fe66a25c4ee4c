//! End-to-end tests over on-disk fixtures: file loading, channel merging and
//! worklist resolution against the merged model.

use can_db_matrix::{
    classify, locate, ByteOrder, ChannelMatrix, Database, MultiplexRole, ValueType, WantedSignal,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CAMERA_DBC: &str = r#"VERSION "1.2"

NS_ :
    NS_DESC_
    CM_
    BA_DEF_
    VAL_
    VAL_TABLE_
    SIG_VALTYPE_

BS_:

BU_: CameraEcu Gateway

BO_ 800 CameraFrame: 8 CameraEcu
 SG_ FrontCameraID : 0|16@1+ (1,0) [0|65535] "" Gateway
 SG_ PageSelect M : 16|4@1+ (1,0) [0|15] "" Gateway
 SG_ ObjDistance m3 : 20|12@0- (0.05,0) [0|200] "m" Gateway
 SG_ Mode : 32|3@1+ (1,0) [0|7] "" Gateway

BO_ 3221225472 VECTOR__INDEPENDENT_SIG_MSG: 0 Vector__XXX
 SG_ Orphan : 0|8@1+ (1,0) [0|255] "" Vector__XXX

CM_ BO_ 800 "front camera status frame";
CM_ SG_ 800 Mode "operating mode";
BA_DEF_ BO_ "GenMsgCycleTime" INT 0 10000;
BA_DEF_DEF_ "GenMsgCycleTime" 100;
BA_ "GenMsgCycleTime" BO_ 800 40;
VAL_ 800 Mode 0 "Off" 1 "Standby" 2 "Active";
"#;

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn round_trip_recovers_exact_signal_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "camera.dbc", CAMERA_DBC);

    let db = Database::load(&path).unwrap();
    assert_eq!(db.version(), Some("1.2"));
    let frame = db.message_by_id(800).unwrap();
    assert_eq!(frame.id_hex(), "0x320");
    assert_eq!(frame.comment.as_deref(), Some("front camera status frame"));

    let id = frame.signal("FrontCameraID").unwrap();
    assert_eq!(id.multiplex, MultiplexRole::Normal);
    assert_eq!((id.start_bit, id.length_bit), (0, 16));
    assert_eq!(id.byte_order, ByteOrder::LittleEndian);
    assert_eq!(id.value_type, ValueType::Unsigned);
    assert_eq!((id.factor, id.offset), (1.0, 0.0));
    assert_eq!((id.value_min, id.value_max), (0.0, 65535.0));
    assert_eq!(id.unit, "");

    let page = frame.signal("PageSelect").unwrap();
    assert_eq!(page.multiplex, MultiplexRole::Multiplexor);

    let dist = frame.signal("ObjDistance").unwrap();
    assert_eq!(dist.multiplex, MultiplexRole::Multiplexed(3));
    assert_eq!(dist.byte_order, ByteOrder::BigEndian);
    assert_eq!(dist.value_type, ValueType::Signed);
    assert_eq!(dist.factor, 0.05);
    assert_eq!(dist.unit, "m");

    let mode = frame.signal("Mode").unwrap();
    assert_eq!(mode.comment.as_deref(), Some("operating mode"));
    let table = mode.value_table.as_ref().unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!((table[2].raw, table[2].label.as_str()), (2, "Active"));
}

#[test]
fn sentinel_message_never_reaches_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "camera.dbc", CAMERA_DBC);

    let db = Database::load(&path).unwrap();
    assert!(db.message_by_id(3221225472).is_none());
    assert_eq!(db.message_count(), 1);
}

#[test]
fn matrix_skips_broken_files_and_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "camera.dbc", CAMERA_DBC);
    // Truncated mid-signal: a parse error, not a load-stopper for the run.
    write_fixture(dir.path(), "broken.dbc", "BO_ 5 Broken: 8 E\n SG_ S : 0|8@");

    let channels: BTreeMap<String, Vec<PathBuf>> = [
        (
            "Ch3".to_string(),
            vec![
                PathBuf::from("camera.dbc"),
                PathBuf::from("broken.dbc"),
                PathBuf::from("missing.dbc"),
            ],
        ),
        ("Ch4".to_string(), Vec::new()),
    ]
    .into();
    let matrix = ChannelMatrix::build(dir.path(), &channels);

    let ch3 = matrix.channel("Ch3").unwrap();
    assert_eq!(ch3.loaded_paths().len(), 1);
    assert_eq!(ch3.message_count(), 1);
    assert!(matrix.channel("Ch4").unwrap().is_empty());
}

#[test]
fn resolver_classifies_against_the_merged_model() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "camera.dbc", CAMERA_DBC);

    let channels: BTreeMap<String, Vec<PathBuf>> =
        [("Ch3".to_string(), vec![PathBuf::from("camera.dbc")])].into();
    let matrix = ChannelMatrix::build(dir.path(), &channels);

    let worklist = vec![
        WantedSignal {
            name: "Mode".to_string(),
            categorical: true,
        },
        WantedSignal {
            name: "FrontCameraID".to_string(),
            categorical: false,
        },
        WantedSignal {
            name: "ObjDistance".to_string(),
            categorical: false,
        },
    ];
    let plan = classify(&worklist, "Cam_id");
    assert_eq!(plan.identity_key, "FrontCameraID");
    assert_eq!(
        plan.categorical,
        vec!["Mode".to_string(), "FrontCameraID".to_string()]
    );
    assert_eq!(plan.continuous, vec!["ObjDistance".to_string()]);

    let locations = locate(&worklist, &matrix);
    assert_eq!(locations["Mode"], vec!["Ch3".to_string()]);
    assert_eq!(locations["ObjDistance"], vec!["Ch3".to_string()]);
}

#[test]
fn model_serializes_to_json() {
    let db = Database::parse(CAMERA_DBC).unwrap();
    let value = serde_json::to_value(&db).unwrap();
    // Private index fields still serialize; the round-trip must preserve
    // message content under the messages map.
    let messages = value.get("messages").unwrap();
    let frame = messages.get("800").unwrap();
    assert_eq!(frame["name"], "CameraFrame");
    assert_eq!(frame["signals"]["ObjDistance"]["multiplex"]["Multiplexed"], 3);
}
