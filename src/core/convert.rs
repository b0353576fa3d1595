//! Raw middleware messages to training elements.
//!
//! Mirrors the recording setup: one converter per element kind, plus a
//! versatile front that routes a raw message to the right converter by
//! datatype and image encoding.

use crate::domain::model::{
    AngleVector, CropRegion, DepthImage, Element, FilterSpec, RawMessage, RgbImage,
};
use crate::domain::ports::ProjectSettings;
use crate::rosbag::messages::{
    ImageMessage, JointStateMessage, IMAGE_DATATYPE, JOINT_STATE_DATATYPE,
};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Wrap an angle onto the circle `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let lower = -std::f64::consts::PI;
    (angle - lower).rem_euclid(2.0 * std::f64::consts::PI) + lower
}

pub trait TypeConverter: Send + Sync {
    type Input;
    type Output;

    fn convert(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// Geometric filter: crop first, then resample to `resolution × resolution`
/// with nearest-neighbour lookup. Identical geometry for RGB and depth so
/// the two stay pixel-registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFilter {
    spec: FilterSpec,
}

impl ImageFilter {
    pub fn new(spec: FilterSpec) -> Self {
        Self { spec }
    }

    pub fn apply<T: Copy>(
        &self,
        height: usize,
        width: usize,
        channels: usize,
        data: &[T],
    ) -> Result<(usize, usize, Vec<T>)> {
        let (mut height, mut width) = (height, width);
        let mut data = data.to_vec();

        if let Some(crop) = self.spec.crop {
            (height, width, data) = crop_image(height, width, channels, &data, crop)?;
        }
        if let Some(resolution) = self.spec.resolution {
            data = resize_nearest(height, width, channels, &data, resolution, resolution);
            height = resolution;
            width = resolution;
        }
        Ok((height, width, data))
    }
}

fn crop_image<T: Copy>(
    height: usize,
    width: usize,
    channels: usize,
    data: &[T],
    crop: CropRegion,
) -> Result<(usize, usize, Vec<T>)> {
    if crop.x_max > width || crop.y_max > height || crop.x_min >= crop.x_max
        || crop.y_min >= crop.y_max
    {
        return Err(EtlError::ProcessingError {
            message: format!(
                "crop box ({},{})..({},{}) does not fit a {}x{} image",
                crop.x_min, crop.y_min, crop.x_max, crop.y_max, width, height
            ),
        });
    }
    let out_h = crop.y_max - crop.y_min;
    let out_w = crop.x_max - crop.x_min;
    let mut out = Vec::with_capacity(out_h * out_w * channels);
    for row in crop.y_min..crop.y_max {
        let start = (row * width + crop.x_min) * channels;
        out.extend_from_slice(&data[start..start + out_w * channels]);
    }
    Ok((out_h, out_w, out))
}

fn resize_nearest<T: Copy>(
    height: usize,
    width: usize,
    channels: usize,
    data: &[T],
    out_h: usize,
    out_w: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(out_h * out_w * channels);
    for row in 0..out_h {
        let src_row = row * height / out_h;
        for col in 0..out_w {
            let src_col = col * width / out_w;
            let start = (src_row * width + src_col) * channels;
            out.extend_from_slice(&data[start..start + channels]);
        }
    }
    out
}

/// Collect a row-major `width × channels` plane out of a possibly padded
/// image buffer (`step` is the recorded row stride in bytes).
fn unpack_rows(msg: &ImageMessage, bytes_per_pixel: usize) -> Result<Vec<u8>> {
    let height = msg.height as usize;
    let width = msg.width as usize;
    let step = msg.step as usize;
    let row_bytes = width * bytes_per_pixel;

    if step < row_bytes || msg.data.len() < step * (height.saturating_sub(1)) + row_bytes {
        return Err(EtlError::MessageDecodeError {
            datatype: IMAGE_DATATYPE.to_string(),
            reason: format!(
                "image buffer of {} bytes is too short for {}x{} (step {})",
                msg.data.len(),
                height,
                width,
                step
            ),
        });
    }

    if step == row_bytes {
        return Ok(msg.data[..row_bytes * height].to_vec());
    }
    let mut out = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * step;
        out.extend_from_slice(&msg.data[start..start + row_bytes]);
    }
    Ok(out)
}

#[derive(Debug, Clone, Default)]
pub struct RgbImageConverter {
    image_filter: Option<ImageFilter>,
}

impl RgbImageConverter {
    pub fn new(image_filter: Option<ImageFilter>) -> Self {
        Self { image_filter }
    }
}

impl TypeConverter for RgbImageConverter {
    type Input = ImageMessage;
    type Output = RgbImage;

    fn convert(&self, msg: &ImageMessage) -> Result<RgbImage> {
        if msg.encoding != "rgb8" && msg.encoding != "bgr8" {
            return Err(EtlError::ProcessingError {
                message: format!("expected an rgb8/bgr8 image, got '{}'", msg.encoding),
            });
        }

        let mut data = unpack_rows(msg, 3)?;
        if msg.encoding == "bgr8" {
            for pixel in data.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
        }

        let (mut height, mut width) = (msg.height as usize, msg.width as usize);
        if let Some(filter) = &self.image_filter {
            (height, width, data) = filter.apply(height, width, 3, &data)?;
        }
        Ok(RgbImage {
            height,
            width,
            data,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DepthImageConverter {
    image_filter: Option<ImageFilter>,
}

impl DepthImageConverter {
    pub fn new(image_filter: Option<ImageFilter>) -> Self {
        Self { image_filter }
    }
}

impl TypeConverter for DepthImageConverter {
    type Input = ImageMessage;
    type Output = DepthImage;

    fn convert(&self, msg: &ImageMessage) -> Result<DepthImage> {
        if msg.encoding != "32FC1" {
            return Err(EtlError::ProcessingError {
                message: format!("expected a 32FC1 depth image, got '{}'", msg.encoding),
            });
        }

        let bytes = unpack_rows(msg, 4)?;
        let mut data: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().expect("4-byte chunk");
                if msg.is_bigendian {
                    f32::from_be_bytes(arr)
                } else {
                    f32::from_le_bytes(arr)
                }
            })
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .collect();

        let (mut height, mut width) = (msg.height as usize, msg.width as usize);
        if let Some(filter) = &self.image_filter {
            (height, width, data) = filter.apply(height, width, 1, &data)?;
        }
        Ok(DepthImage {
            height,
            width,
            data,
        })
    }
}

/// Joint-state → angle vector for the configured control joints.
///
/// Joint order inside a message is driver-defined, so the name → index map
/// is resolved from the first message and reused afterwards.
#[derive(Debug, Default)]
pub struct JointStateConverter {
    control_joints: Vec<String>,
    joint_indices: OnceLock<Vec<usize>>,
}

impl JointStateConverter {
    pub fn new(control_joints: Vec<String>) -> Self {
        Self {
            control_joints,
            joint_indices: OnceLock::new(),
        }
    }

    fn resolve_indices(&self, msg: &JointStateMessage) -> Result<Vec<usize>> {
        let name_to_idx: HashMap<&str, usize> = msg
            .name
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        self.control_joints
            .iter()
            .map(|joint| {
                name_to_idx
                    .get(joint.as_str())
                    .copied()
                    .ok_or_else(|| EtlError::ProcessingError {
                        message: format!("control joint '{}' is not in the joint_states message", joint),
                    })
            })
            .collect()
    }
}

impl TypeConverter for JointStateConverter {
    type Input = JointStateMessage;
    type Output = AngleVector;

    fn convert(&self, msg: &JointStateMessage) -> Result<AngleVector> {
        let indices = match self.joint_indices.get() {
            Some(indices) => indices,
            None => {
                let resolved = self.resolve_indices(msg)?;
                self.joint_indices.get_or_init(|| resolved)
            }
        };

        let mut angles = Vec::with_capacity(indices.len());
        for &idx in indices {
            let position = msg.position.get(idx).ok_or_else(|| EtlError::ProcessingError {
                message: format!(
                    "joint_states message has {} positions, index {} requested",
                    msg.position.len(),
                    idx
                ),
            })?;
            angles.push(wrap_angle(*position));
        }
        Ok(AngleVector(angles))
    }
}

/// Routes any raw message the pipeline encounters to the right converter.
pub struct VersatileConverter {
    rgb: RgbImageConverter,
    depth: DepthImageConverter,
    joints: JointStateConverter,
}

impl VersatileConverter {
    pub fn new(
        rgb: RgbImageConverter,
        depth: DepthImageConverter,
        joints: JointStateConverter,
    ) -> Self {
        Self { rgb, depth, joints }
    }

    pub fn from_settings(settings: &impl ProjectSettings) -> Self {
        let filter = settings.image_filter().map(ImageFilter::new);
        Self {
            rgb: RgbImageConverter::new(filter),
            depth: DepthImageConverter::new(filter),
            joints: JointStateConverter::new(settings.control_joints().to_vec()),
        }
    }

    pub fn convert(&self, msg: &RawMessage) -> Result<Element> {
        match msg.datatype.as_str() {
            IMAGE_DATATYPE => {
                let image = ImageMessage::decode(&msg.data)?;
                match image.encoding.as_str() {
                    "rgb8" | "bgr8" => Ok(Element::Rgb(self.rgb.convert(&image)?)),
                    "32FC1" => Ok(Element::Depth(self.depth.convert(&image)?)),
                    other => Err(EtlError::ProcessingError {
                        message: format!("no converter for image encoding '{}'", other),
                    }),
                }
            }
            JOINT_STATE_DATATYPE => {
                let joints = JointStateMessage::decode(&msg.data)?;
                Ok(Element::Angles(self.joints.convert(&joints)?))
            }
            other => Err(EtlError::ProcessingError {
                message: format!("no converter compatible with '{}'", other),
            }),
        }
    }
}
