//! On-disk grammar of bag files (format version 2.0).
//!
//! A bag is the magic line followed by records. Every record is
//! `header_len(u32) + header + data_len(u32) + data`, where the header is a
//! run of `len(u32) + "name=value"` fields and the record kind lives in the
//! `op` field.

use std::collections::HashMap;

/// First line of every supported bag file.
pub const BAG_MAGIC: &[u8] = b"#ROSBAG V2.0\n";

pub const OP_MESSAGE_DATA: u8 = 0x02;
pub const OP_BAG_HEADER: u8 = 0x03;
pub const OP_INDEX_DATA: u8 = 0x04;
pub const OP_CHUNK: u8 = 0x05;
pub const OP_CHUNK_INFO: u8 = 0x06;
pub const OP_CONNECTION: u8 = 0x07;

/// Chunk compression value this reader accepts.
pub const COMPRESSION_NONE: &str = "none";

/// Format-level failure; the reader wraps it with the bag's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    Truncated(&'static str),
    MissingField(&'static str),
    FieldTooShort(&'static str),
    BadUtf8(&'static str),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::Truncated(what) => write!(f, "truncated while reading {}", what),
            RecordError::MissingField(name) => write!(f, "record header lacks field '{}'", name),
            RecordError::FieldTooShort(name) => write!(f, "field '{}' is too short", name),
            RecordError::BadUtf8(name) => write!(f, "field '{}' is not valid UTF-8", name),
        }
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Forward-only view over a byte slice with little-endian primitives.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn take(&mut self, n: usize, what: &'static str) -> RecordResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(RecordError::Truncated(what))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self, what: &'static str) -> RecordResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn read_u32(&mut self, what: &'static str) -> RecordResult<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
    }

    pub fn read_f64(&mut self, what: &'static str) -> RecordResult<f64> {
        let bytes = self.take(8, what)?;
        Ok(f64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
    }

    /// ROS time: u32 seconds + u32 nanoseconds, as fractional seconds.
    pub fn read_time(&mut self, what: &'static str) -> RecordResult<f64> {
        let sec = self.read_u32(what)?;
        let nsec = self.read_u32(what)?;
        Ok(f64::from(sec) + f64::from(nsec) * 1e-9)
    }

    /// u32 length prefix + UTF-8 bytes.
    pub fn read_string(&mut self, what: &'static str) -> RecordResult<String> {
        let len = self.read_u32(what)? as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| RecordError::BadUtf8(what))
    }
}

/// Parsed record header: field name → raw value bytes.
#[derive(Debug)]
pub struct HeaderFields(HashMap<String, Vec<u8>>);

impl HeaderFields {
    pub fn parse(bytes: &[u8]) -> RecordResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let mut fields = HashMap::new();
        while !reader.is_empty() {
            let len = reader.read_u32("header field length")? as usize;
            let field = reader.take(len, "header field")?;
            let sep = field
                .iter()
                .position(|&b| b == b'=')
                .ok_or(RecordError::FieldTooShort("header field"))?;
            let name = std::str::from_utf8(&field[..sep])
                .map_err(|_| RecordError::BadUtf8("header field name"))?;
            fields.insert(name.to_string(), field[sep + 1..].to_vec());
        }
        Ok(Self(fields))
    }

    pub fn op(&self) -> RecordResult<u8> {
        let bytes = self.get("op")?;
        bytes
            .first()
            .copied()
            .ok_or(RecordError::FieldTooShort("op"))
    }

    pub fn get(&self, name: &'static str) -> RecordResult<&[u8]> {
        self.0
            .get(name)
            .map(Vec::as_slice)
            .ok_or(RecordError::MissingField(name))
    }

    pub fn get_u32(&self, name: &'static str) -> RecordResult<u32> {
        let bytes = self.get(name)?;
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| RecordError::FieldTooShort(name))?;
        Ok(u32::from_le_bytes(arr))
    }

    pub fn get_time(&self, name: &'static str) -> RecordResult<f64> {
        let bytes = self.get(name)?;
        if bytes.len() != 8 {
            return Err(RecordError::FieldTooShort(name));
        }
        let sec = u32::from_le_bytes(bytes[..4].try_into().expect("4-byte slice"));
        let nsec = u32::from_le_bytes(bytes[4..].try_into().expect("4-byte slice"));
        Ok(f64::from(sec) + f64::from(nsec) * 1e-9)
    }

    pub fn get_str(&self, name: &'static str) -> RecordResult<&str> {
        std::str::from_utf8(self.get(name)?).map_err(|_| RecordError::BadUtf8(name))
    }
}
