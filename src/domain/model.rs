use serde::{Deserialize, Serialize};

/// One serialized message pulled out of a bag, before decoding.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub datatype: String,
    /// Receive time in seconds since the epoch.
    pub time: f64,
    pub data: Vec<u8>,
}

/// A topic's ordered samples paired with their timestamps.
///
/// Invariant: `object_list.len() == time_list.len()` and `time_list` is
/// non-decreasing once `sort_by_time` has been called.
#[derive(Debug, Clone)]
pub struct TimeStampedSequence<T> {
    pub topic_name: String,
    pub object_list: Vec<T>,
    pub time_list: Vec<f64>,
}

impl<T> TimeStampedSequence<T> {
    pub fn new(topic_name: impl Into<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            object_list: Vec::new(),
            time_list: Vec::new(),
        }
    }

    pub fn push(&mut self, object: T, time: f64) {
        self.object_list.push(object);
        self.time_list.push(time);
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    /// First and last timestamp, if any samples exist.
    pub fn time_bound(&self) -> Option<(f64, f64)> {
        match (self.time_list.first(), self.time_list.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }

    pub fn sort_by_time(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.time_list[a].total_cmp(&self.time_list[b]));

        let mut objects: Vec<Option<T>> = self.object_list.drain(..).map(Some).collect();
        let times = std::mem::take(&mut self.time_list);
        for idx in order {
            self.object_list
                .push(objects[idx].take().expect("index visited once"));
            self.time_list.push(times[idx]);
        }
    }
}

/// RGB image element: packed `rgb8`, row-major, `height * width * 3` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    pub height: usize,
    pub width: usize,
    pub data: Vec<u8>,
}

/// Depth image element: row-major `f32` metres, `height * width` values.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

/// Joint angles for the configured control joints, wrapped onto `[-π, π)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleVector(pub Vec<f64>);

/// Pixel box kept by the crop step. `x` is the column axis, max is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

/// Geometric image filter description, as configured per project.
/// Crop is applied before the resolution change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterSpec {
    pub crop: Option<CropRegion>,
    pub resolution: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    RgbImage,
    DepthImage,
    AngleVector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rgb(RgbImage),
    Depth(DepthImage),
    Angles(AngleVector),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Rgb(_) => ElementKind::RgbImage,
            Element::Depth(_) => ElementKind::DepthImage,
            Element::Angles(_) => ElementKind::AngleVector,
        }
    }
}

/// One topic's converted elements, aligned to the episode time grid.
#[derive(Debug, Clone)]
pub struct ElementSequence {
    pub topic_name: String,
    pub kind: ElementKind,
    pub elements: Vec<Element>,
}

/// All element sequences from one bag, sharing one time grid.
#[derive(Debug, Clone)]
pub struct EpisodeData {
    pub bag_name: String,
    pub times: Vec<f64>,
    pub sequences: Vec<ElementSequence>,
}

impl EpisodeData {
    /// Number of synchronized frames (same for every sequence).
    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    pub fn sequence_of(&self, kind: ElementKind) -> Option<&ElementSequence> {
        self.sequences.iter().find(|s| s.kind == kind)
    }
}

/// Raw extraction output: one entry per bag file.
#[derive(Debug, Clone)]
pub struct BagRecord {
    pub bag_name: String,
    pub sequences: Vec<TimeStampedSequence<RawMessage>>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub episodes: Vec<EpisodeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub topic: String,
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub bag_name: String,
    pub frame_count: usize,
    pub streams: Vec<StreamMetadata>,
}

/// `metadata.json` of the bundle archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub project: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sampling_hz: f64,
    pub control_joints: Vec<String>,
    pub episodes: Vec<EpisodeMetadata>,
}
