use crate::domain::model::{RawMessage, TimeStampedSequence};
use crate::rosbag::format::{
    ByteReader, HeaderFields, RecordError, BAG_MAGIC, COMPRESSION_NONE, OP_CHUNK, OP_CONNECTION,
    OP_MESSAGE_DATA,
};
use crate::utils::error::{EtlError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Resolved connection record: what a connection id points at.
#[derive(Debug, Clone)]
pub struct Connection {
    pub topic: String,
    pub datatype: String,
}

/// Per-topic accounting produced by [`BagReader::summarize`].
#[derive(Debug, Clone)]
pub struct TopicSummary {
    pub topic: String,
    pub datatype: String,
    pub message_count: usize,
    pub first_time: Option<f64>,
    pub last_time: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct BagSummary {
    pub topics: Vec<TopicSummary>,
}

impl BagSummary {
    pub fn message_count(&self) -> usize {
        self.topics.iter().map(|t| t.message_count).sum()
    }

    /// Overall recording span across all topics.
    pub fn time_bound(&self) -> Option<(f64, f64)> {
        let first = self
            .topics
            .iter()
            .filter_map(|t| t.first_time)
            .min_by(f64::total_cmp)?;
        let last = self
            .topics
            .iter()
            .filter_map(|t| t.last_time)
            .max_by(f64::total_cmp)?;
        Some((first, last))
    }
}

/// Reader for bag files (format v2.0).
///
/// The whole file is held in memory; bags produced by teaching sessions are
/// minutes long, not hours. Index and chunk-info records are ignored, the
/// reader walks every record in file order instead.
pub struct BagReader {
    data: Vec<u8>,
    name: String,
}

impl BagReader {
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(data, &path.display().to_string())
    }

    /// Parse from an in-memory buffer; `name` is used in error messages.
    pub fn from_bytes(data: Vec<u8>, name: &str) -> Result<Self> {
        if !data.starts_with(BAG_MAGIC) {
            return Err(EtlError::BagFormatError {
                path: name.to_string(),
                reason: "missing '#ROSBAG V2.0' magic line".to_string(),
            });
        }
        Ok(Self {
            data,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collect every message on the requested topics, in file order.
    pub fn read_messages(&self, topics: &[String]) -> Result<Vec<RawMessage>> {
        let wanted: HashSet<&str> = topics.iter().map(String::as_str).collect();
        let mut messages = Vec::new();
        self.walk(|conn, time, body| {
            if wanted.contains(conn.topic.as_str()) {
                messages.push(RawMessage {
                    topic: conn.topic.clone(),
                    datatype: conn.datatype.clone(),
                    time,
                    data: body.to_vec(),
                });
            }
        })?;
        Ok(messages)
    }

    /// Per-topic message counts and time spans, for `bag_info` style output.
    pub fn summarize(&self) -> Result<BagSummary> {
        let mut connections: HashMap<u32, Connection> = HashMap::new();
        let mut stats: BTreeMap<String, TopicSummary> = BTreeMap::new();

        self.walk_records(&self.data[BAG_MAGIC.len()..], &mut connections, &mut |conn,
                                                                                 time,
                                                                                 _body| {
            let entry = stats
                .entry(conn.topic.clone())
                .or_insert_with(|| TopicSummary {
                    topic: conn.topic.clone(),
                    datatype: conn.datatype.clone(),
                    message_count: 0,
                    first_time: None,
                    last_time: None,
                });
            entry.message_count += 1;
            entry.first_time = Some(entry.first_time.map_or(time, |t: f64| t.min(time)));
            entry.last_time = Some(entry.last_time.map_or(time, |t: f64| t.max(time)));
        })?;

        // Topics that were advertised but never published still show up.
        for conn in connections.values() {
            stats
                .entry(conn.topic.clone())
                .or_insert_with(|| TopicSummary {
                    topic: conn.topic.clone(),
                    datatype: conn.datatype.clone(),
                    message_count: 0,
                    first_time: None,
                    last_time: None,
                });
        }

        Ok(BagSummary {
            topics: stats.into_values().collect(),
        })
    }

    fn walk(&self, mut visit: impl FnMut(&Connection, f64, &[u8])) -> Result<()> {
        let mut connections: HashMap<u32, Connection> = HashMap::new();
        self.walk_records(&self.data[BAG_MAGIC.len()..], &mut connections, &mut visit)
    }

    fn walk_records(
        &self,
        bytes: &[u8],
        connections: &mut HashMap<u32, Connection>,
        visit: &mut impl FnMut(&Connection, f64, &[u8]),
    ) -> Result<()> {
        let mut reader = ByteReader::new(bytes);
        while !reader.is_empty() {
            let header_len = self.ok(reader.read_u32("record header length"))? as usize;
            let header_bytes = self.ok(reader.take(header_len, "record header"))?;
            let header = self.ok(HeaderFields::parse(header_bytes))?;
            let data_len = self.ok(reader.read_u32("record data length"))? as usize;
            let data = self.ok(reader.take(data_len, "record data"))?;

            match self.ok(header.op())? {
                OP_CONNECTION => {
                    let conn_id = self.ok(header.get_u32("conn"))?;
                    let topic = self.ok(header.get_str("topic"))?.to_string();
                    // The connection header (with the datatype) is the record body.
                    let conn_header = self.ok(HeaderFields::parse(data))?;
                    let datatype = self.ok(conn_header.get_str("type"))?.to_string();
                    connections.insert(conn_id, Connection { topic, datatype });
                }
                OP_CHUNK => {
                    let compression = self.ok(header.get_str("compression"))?;
                    if compression != COMPRESSION_NONE {
                        return Err(EtlError::UnsupportedCompressionError {
                            compression: compression.to_string(),
                        });
                    }
                    self.walk_records(data, connections, visit)?;
                }
                OP_MESSAGE_DATA => {
                    let conn_id = self.ok(header.get_u32("conn"))?;
                    let time = self.ok(header.get_time("time"))?;
                    let conn = connections.get(&conn_id).ok_or_else(|| {
                        EtlError::BagFormatError {
                            path: self.name.clone(),
                            reason: format!("message references unknown connection {}", conn_id),
                        }
                    })?;
                    visit(conn, time, data);
                }
                // Bag header, index and chunk-info records carry no message data.
                _ => {}
            }
        }
        Ok(())
    }

    fn ok<T>(&self, result: std::result::Result<T, RecordError>) -> Result<T> {
        result.map_err(|e| EtlError::BagFormatError {
            path: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// Group a bag's messages into one time-sorted sequence per requested topic.
///
/// The output order matches `topics`. A topic with no recorded messages is
/// an error; an episode cannot be synchronized without it.
pub fn bag_to_sequences(
    reader: &BagReader,
    topics: &[String],
) -> Result<Vec<TimeStampedSequence<RawMessage>>> {
    let messages = reader.read_messages(topics)?;

    let mut by_topic: HashMap<&str, TimeStampedSequence<RawMessage>> = topics
        .iter()
        .map(|t| (t.as_str(), TimeStampedSequence::new(t.clone())))
        .collect();
    for message in messages {
        let time = message.time;
        if let Some(seq) = by_topic.get_mut(message.topic.as_str()) {
            seq.push(message, time);
        }
    }

    let mut sequences = Vec::with_capacity(topics.len());
    for topic in topics {
        let mut seq = by_topic.remove(topic.as_str()).expect("inserted above");
        if seq.is_empty() {
            return Err(EtlError::TopicMissingError {
                topic: topic.clone(),
                path: reader.name().to_string(),
            });
        }
        seq.sort_by_time();
        sequences.push(seq);
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rosbag::testkit::{bag, chunk_record, connection_record, message_record};

    #[test]
    fn test_rejects_bad_magic() {
        let result = BagReader::from_bytes(b"#ROSBAG V1.2\n".to_vec(), "old.bag");
        assert!(matches!(result, Err(EtlError::BagFormatError { .. })));
    }

    #[test]
    fn test_reads_top_level_messages() {
        let bytes = bag(&[
            connection_record(0, "/joint_states", "sensor_msgs/JointState"),
            message_record(0, 10.0, b"aaaa"),
            message_record(0, 11.0, b"bbbb"),
        ]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        let messages = reader
            .read_messages(&["/joint_states".to_string()])
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].datatype, "sensor_msgs/JointState");
        assert_eq!(messages[0].time, 10.0);
        assert_eq!(messages[1].data, b"bbbb");
    }

    #[test]
    fn test_reads_messages_inside_uncompressed_chunk() {
        let bytes = bag(&[chunk_record(
            "none",
            &[
                connection_record(3, "/camera/rgb", "sensor_msgs/Image"),
                message_record(3, 7.0, b"pix"),
            ],
        )]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        let messages = reader.read_messages(&["/camera/rgb".to_string()]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "/camera/rgb");
    }

    #[test]
    fn test_compressed_chunk_is_rejected() {
        let bytes = bag(&[chunk_record("bz2", &[])]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        let err = reader.read_messages(&[]).unwrap_err();
        assert!(
            matches!(err, EtlError::UnsupportedCompressionError { compression } if compression == "bz2")
        );
    }

    #[test]
    fn test_unknown_connection_is_a_format_error() {
        let bytes = bag(&[message_record(9, 1.0, b"x")]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        assert!(matches!(
            reader.read_messages(&[]),
            Err(EtlError::BagFormatError { .. })
        ));
    }

    #[test]
    fn test_filters_by_topic() {
        let bytes = bag(&[
            connection_record(0, "/keep", "sensor_msgs/JointState"),
            connection_record(1, "/skip", "sensor_msgs/Image"),
            message_record(0, 1.0, b"k"),
            message_record(1, 1.0, b"s"),
        ]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        let messages = reader.read_messages(&["/keep".to_string()]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "/keep");
    }

    #[test]
    fn test_summarize_counts_and_spans() {
        let bytes = bag(&[
            connection_record(0, "/joint_states", "sensor_msgs/JointState"),
            connection_record(1, "/silent", "sensor_msgs/Image"),
            message_record(0, 5.0, b"a"),
            message_record(0, 9.0, b"b"),
        ]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        let summary = reader.summarize().unwrap();

        assert_eq!(summary.message_count(), 2);
        assert_eq!(summary.time_bound(), Some((5.0, 9.0)));

        let joints = summary
            .topics
            .iter()
            .find(|t| t.topic == "/joint_states")
            .unwrap();
        assert_eq!(joints.message_count, 2);
        let silent = summary.topics.iter().find(|t| t.topic == "/silent").unwrap();
        assert_eq!(silent.message_count, 0);
        assert!(silent.first_time.is_none());
    }

    #[test]
    fn test_bag_to_sequences_sorts_and_requires_topics() {
        let bytes = bag(&[
            connection_record(0, "/joint_states", "sensor_msgs/JointState"),
            message_record(0, 9.0, b"late"),
            message_record(0, 5.0, b"early"),
        ]);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();

        let seqs = bag_to_sequences(&reader, &["/joint_states".to_string()]).unwrap();
        assert_eq!(seqs[0].time_list, vec![5.0, 9.0]);
        assert_eq!(seqs[0].object_list[0].data, b"early");

        let missing = bag_to_sequences(&reader, &["/absent".to_string()]);
        assert!(matches!(missing, Err(EtlError::TopicMissingError { .. })));
    }

    #[test]
    fn test_truncated_record_is_an_error_not_a_panic() {
        let mut bytes = bag(&[connection_record(0, "/t", "sensor_msgs/Image")]);
        bytes.truncate(bytes.len() - 3);
        let reader = BagReader::from_bytes(bytes, "test.bag").unwrap();
        assert!(matches!(
            reader.read_messages(&[]),
            Err(EtlError::BagFormatError { .. })
        ));
    }
}
