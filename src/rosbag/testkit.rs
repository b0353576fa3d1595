//! Builders for synthetic bag bytes used across unit tests.

use crate::rosbag::format::{
    BAG_MAGIC, OP_BAG_HEADER, OP_CHUNK, OP_CONNECTION, OP_MESSAGE_DATA,
};

pub fn field(name: &str, value: &[u8]) -> Vec<u8> {
    let body = [name.as_bytes(), b"=", value].concat();
    let mut out = (body.len() as u32).to_le_bytes().to_vec();
    out.extend(body);
    out
}

pub fn record(header: &[Vec<u8>], data: &[u8]) -> Vec<u8> {
    let header: Vec<u8> = header.concat();
    let mut out = (header.len() as u32).to_le_bytes().to_vec();
    out.extend(header);
    out.extend((data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

pub fn connection_record(conn: u32, topic: &str, datatype: &str) -> Vec<u8> {
    let conn_header = field("type", datatype.as_bytes());
    record(
        &[
            field("op", &[OP_CONNECTION]),
            field("conn", &conn.to_le_bytes()),
            field("topic", topic.as_bytes()),
        ],
        &conn_header,
    )
}

pub fn message_record(conn: u32, time: f64, body: &[u8]) -> Vec<u8> {
    let sec = time as u32;
    let nsec = ((time - f64::from(sec)) * 1e9).round() as u32;
    let mut stamp = sec.to_le_bytes().to_vec();
    stamp.extend(nsec.to_le_bytes());
    record(
        &[
            field("op", &[OP_MESSAGE_DATA]),
            field("conn", &conn.to_le_bytes()),
            field("time", &stamp),
        ],
        body,
    )
}

pub fn chunk_record(compression: &str, embedded: &[Vec<u8>]) -> Vec<u8> {
    let data: Vec<u8> = embedded.concat();
    record(
        &[
            field("op", &[OP_CHUNK]),
            field("compression", compression.as_bytes()),
            field("size", &(data.len() as u32).to_le_bytes()),
        ],
        &data,
    )
}

pub fn bag(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = BAG_MAGIC.to_vec();
    out.extend(record(
        &[
            field("op", &[OP_BAG_HEADER]),
            field("index_pos", &0u64.to_le_bytes()),
            field("conn_count", &1u32.to_le_bytes()),
            field("chunk_count", &0u32.to_le_bytes()),
        ],
        &[0u8; 16],
    ));
    for r in records {
        out.extend_from_slice(r);
    }
    out
}
