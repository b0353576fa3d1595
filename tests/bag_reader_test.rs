mod common;

use bag_etl::rosbag::{bag_to_sequences, BagReader};
use bag_etl::EtlError;
use std::fs;
use tempfile::TempDir;

fn write_bag(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_open_and_summarize_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_bag(&dir, "demo.bag", &common::teaching_bag(5, 2.0, 20.0, true));

    let reader = BagReader::open(&path).unwrap();
    let summary = reader.summarize().unwrap();

    assert_eq!(summary.topics.len(), 3);
    assert_eq!(summary.message_count(), 15);

    let rgb = summary
        .topics
        .iter()
        .find(|t| t.topic == "/camera/rgb/image_raw")
        .unwrap();
    assert_eq!(rgb.datatype, "sensor_msgs/Image");
    assert_eq!(rgb.message_count, 5);

    let (start, end) = summary.time_bound().unwrap();
    assert!(start >= 20.0);
    assert!(end > start);
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = BagReader::open(&dir.path().join("absent.bag"));
    assert!(matches!(result, Err(EtlError::IoError(_))));
}

#[test]
fn test_open_non_bag_file_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = write_bag(&dir, "not_a_bag.bag", b"just some text\n");
    assert!(matches!(
        BagReader::open(&path),
        Err(EtlError::BagFormatError { .. })
    ));
}

#[test]
fn test_truncated_bag_is_format_error() {
    let dir = TempDir::new().unwrap();
    let mut bytes = common::teaching_bag(2, 2.0, 0.0, false);
    bytes.truncate(bytes.len() - 10);
    let path = write_bag(&dir, "cut.bag", &bytes);

    let reader = BagReader::open(&path).unwrap();
    assert!(matches!(
        reader.read_messages(&["/joint_states".to_string()]),
        Err(EtlError::BagFormatError { .. })
    ));
}

#[test]
fn test_sequences_preserve_requested_topic_order() {
    let dir = TempDir::new().unwrap();
    let path = write_bag(&dir, "demo.bag", &common::teaching_bag(3, 2.0, 5.0, false));
    let reader = BagReader::open(&path).unwrap();

    let topics = vec![
        "/joint_states".to_string(),
        "/camera/rgb/image_raw".to_string(),
    ];
    let seqs = bag_to_sequences(&reader, &topics).unwrap();

    assert_eq!(seqs.len(), 2);
    assert_eq!(seqs[0].topic_name, "/joint_states");
    assert_eq!(seqs[1].topic_name, "/camera/rgb/image_raw");
    assert_eq!(seqs[0].len(), 3);
    assert!(seqs[0]
        .time_list
        .windows(2)
        .all(|pair| pair[1] >= pair[0]));
}

#[test]
fn test_messages_inside_chunks_are_read() {
    let embedded = vec![
        common::connection_record(0, "/joint_states", "sensor_msgs/JointState"),
        common::message_record(0, 1.0, &common::joint_state_body(&["elbow"], &[0.5])),
        common::message_record(0, 2.0, &common::joint_state_body(&["elbow"], &[0.6])),
    ];
    let bytes = common::bag(&[common::chunk_record("none", &embedded)]);

    let dir = TempDir::new().unwrap();
    let path = write_bag(&dir, "chunked.bag", &bytes);
    let reader = BagReader::open(&path).unwrap();

    let messages = reader
        .read_messages(&["/joint_states".to_string()])
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].time, 1.0);
}
