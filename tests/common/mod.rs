//! Builders for synthetic bag files used by the integration tests.
//!
//! The byte layout follows the bag v2.0 grammar: magic line, then records of
//! `header_len + header-fields + data_len + data`.

#![allow(dead_code)]

const OP_MESSAGE_DATA: u8 = 0x02;
const OP_BAG_HEADER: u8 = 0x03;
const OP_CHUNK: u8 = 0x05;
const OP_CONNECTION: u8 = 0x07;

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
    let mut out = b"#ROSBAG V2.0\n".to_vec();
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

// ---- message body encoders (ROS1 little-endian serialization) ----

pub fn ros_string(s: &str) -> Vec<u8> {
    let mut out = (s.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    out
}

pub fn std_header() -> Vec<u8> {
    let mut out = 0u32.to_le_bytes().to_vec();
    out.extend(0u32.to_le_bytes());
    out.extend(0u32.to_le_bytes());
    out.extend(ros_string("base_link"));
    out
}

pub fn image_body(height: u32, width: u32, encoding: &str, pixels: &[u8]) -> Vec<u8> {
    let mut out = std_header();
    out.extend(height.to_le_bytes());
    out.extend(width.to_le_bytes());
    out.extend(ros_string(encoding));
    out.push(0);
    let bytes_per_pixel = if encoding == "32FC1" { 4 } else { 3 };
    out.extend((width * bytes_per_pixel).to_le_bytes());
    out.extend((pixels.len() as u32).to_le_bytes());
    out.extend_from_slice(pixels);
    out
}

pub fn f64_array(values: &[f64]) -> Vec<u8> {
    let mut out = (values.len() as u32).to_le_bytes().to_vec();
    for v in values {
        out.extend(v.to_le_bytes());
    }
    out
}

pub fn joint_state_body(names: &[&str], positions: &[f64]) -> Vec<u8> {
    let mut out = std_header();
    out.extend((names.len() as u32).to_le_bytes());
    for name in names {
        out.extend(ros_string(name));
    }
    out.extend(f64_array(positions));
    out.extend(f64_array(&[]));
    out.extend(f64_array(&[]));
    out
}

/// A bag with `frames` aligned RGB + joint-state pairs at `hz`, plus an
/// optional depth stream, starting at `t0`.
pub fn teaching_bag(frames: usize, hz: f64, t0: f64, with_depth: bool) -> Vec<u8> {
    let period = 1.0 / hz;
    let mut records = vec![
        connection_record(0, "/camera/rgb/image_raw", "sensor_msgs/Image"),
        connection_record(1, "/joint_states", "sensor_msgs/JointState"),
    ];
    if with_depth {
        records.push(connection_record(
            2,
            "/camera/depth/image_raw",
            "sensor_msgs/Image",
        ));
    }

    for frame in 0..frames {
        let t = t0 + frame as f64 * period;
        let pixels = vec![frame as u8; 4 * 4 * 3];
        records.push(message_record(0, t, &image_body(4, 4, "rgb8", &pixels)));
        records.push(message_record(
            1,
            t + period * 0.2,
            &joint_state_body(
                &["r_shoulder_pan_joint", "r_elbow_flex_joint"],
                &[0.1 * frame as f64, -0.5],
            ),
        ));
        if with_depth {
            let mut depth = Vec::new();
            for _ in 0..4 * 4 {
                depth.extend((frame as f32).to_le_bytes());
            }
            records.push(message_record(
                2,
                t + period * 0.4,
                &image_body(4, 4, "32FC1", &depth),
            ));
        }
    }
    bag(&records)
}
