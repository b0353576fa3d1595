//! Wire decoding for the message types the pipeline consumes.
//!
//! ROS1 serialization: little-endian scalars, strings and arrays carry a
//! u32 length/count prefix. Only the two datatypes the converters need are
//! decoded here.

use crate::rosbag::format::{ByteReader, RecordResult};
use crate::utils::error::{EtlError, Result};

pub const IMAGE_DATATYPE: &str = "sensor_msgs/Image";
pub const JOINT_STATE_DATATYPE: &str = "sensor_msgs/JointState";

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMessage {
    /// Header stamp in seconds.
    pub stamp: f64,
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    pub is_bigendian: bool,
    pub step: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointStateMessage {
    pub stamp: f64,
    pub name: Vec<String>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub effort: Vec<f64>,
}

/// std_msgs/Header: seq, stamp, frame_id. Only the stamp is kept.
fn decode_std_header(reader: &mut ByteReader<'_>) -> RecordResult<f64> {
    let _seq = reader.read_u32("header.seq")?;
    let stamp = reader.read_time("header.stamp")?;
    let _frame_id = reader.read_string("header.frame_id")?;
    Ok(stamp)
}

fn read_f64_array(reader: &mut ByteReader<'_>, what: &'static str) -> RecordResult<Vec<f64>> {
    let count = reader.read_u32(what)? as usize;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(reader.read_f64(what)?);
    }
    Ok(values)
}

fn read_string_array(reader: &mut ByteReader<'_>, what: &'static str) -> RecordResult<Vec<String>> {
    let count = reader.read_u32(what)? as usize;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(reader.read_string(what)?);
    }
    Ok(values)
}

fn decode_err(datatype: &str, reason: impl std::fmt::Display) -> EtlError {
    EtlError::MessageDecodeError {
        datatype: datatype.to_string(),
        reason: reason.to_string(),
    }
}

impl ImageMessage {
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_inner(data).map_err(|e| decode_err(IMAGE_DATATYPE, e))
    }

    fn decode_inner(data: &[u8]) -> RecordResult<Self> {
        let mut reader = ByteReader::new(data);
        let stamp = decode_std_header(&mut reader)?;
        let height = reader.read_u32("height")?;
        let width = reader.read_u32("width")?;
        let encoding = reader.read_string("encoding")?;
        let is_bigendian = reader.read_u8("is_bigendian")? != 0;
        let step = reader.read_u32("step")?;
        let len = reader.read_u32("data length")? as usize;
        let data = reader.take(len, "image data")?.to_vec();
        Ok(Self {
            stamp,
            height,
            width,
            encoding,
            is_bigendian,
            step,
            data,
        })
    }
}

impl JointStateMessage {
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_inner(data).map_err(|e| decode_err(JOINT_STATE_DATATYPE, e))
    }

    fn decode_inner(data: &[u8]) -> RecordResult<Self> {
        let mut reader = ByteReader::new(data);
        let stamp = decode_std_header(&mut reader)?;
        let name = read_string_array(&mut reader, "name")?;
        let position = read_f64_array(&mut reader, "position")?;
        let velocity = read_f64_array(&mut reader, "velocity")?;
        let effort = read_f64_array(&mut reader, "effort")?;
        Ok(Self {
            stamp,
            name,
            position,
            velocity,
            effort,
        })
    }
}
