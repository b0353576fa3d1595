use crate::core::convert::VersatileConverter;
use crate::core::interpolate::{AllSameRule, NearestNeighbour};
use crate::core::sync::{bin_count, pack_to_bins, synchronize_binned, union_time_bound};
use crate::core::{BagRecord, Pipeline, ProjectSettings, Storage, TransformResult};
use crate::domain::model::{
    AngleVector, BundleMetadata, Element, ElementKind, ElementSequence, EpisodeData,
    EpisodeMetadata, StreamMetadata,
};
use crate::rosbag::{bag_to_sequences, BagReader};
use crate::utils::error::{EtlError, Result};
use crate::utils::file::ROSBAG_DIR_NAME;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Bags in, bundle archive out.
pub struct BagPipeline<S: Storage, C: ProjectSettings> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ProjectSettings> BagPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn episode_metadata(episode: &EpisodeData) -> EpisodeMetadata {
        let streams = episode
            .sequences
            .iter()
            .map(|seq| {
                let (height, width) = match seq.elements.first() {
                    Some(Element::Rgb(img)) => (Some(img.height), Some(img.width)),
                    Some(Element::Depth(img)) => (Some(img.height), Some(img.width)),
                    _ => (None, None),
                };
                StreamMetadata {
                    topic: seq.topic_name.clone(),
                    kind: seq.kind,
                    height,
                    width,
                }
            })
            .collect();
        EpisodeMetadata {
            bag_name: episode.bag_name.clone(),
            frame_count: episode.frame_count(),
            streams,
        }
    }

    fn angles_csv(&self, episode: &EpisodeData, seq: &ElementSequence) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["time".to_string()];
        header.extend(self.config.control_joints().iter().cloned());
        writer.write_record(&header)?;

        for (time, element) in episode.times.iter().zip(&seq.elements) {
            if let Element::Angles(AngleVector(angles)) = element {
                let mut row = vec![format!("{:.6}", time)];
                row.extend(angles.iter().map(|a| a.to_string()));
                writer.write_record(&row)?;
            }
        }

        writer
            .into_inner()
            .map_err(|e| EtlError::ProcessingError {
                message: format!("failed to flush angles csv: {}", e),
            })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ProjectSettings> Pipeline for BagPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<BagRecord>> {
        let topics = self.config.topic_list();
        let files = self.storage.list_files(ROSBAG_DIR_NAME).await?;

        let mut records = Vec::new();
        for name in files.iter().filter(|n| n.ends_with(".bag")) {
            tracing::debug!("Reading bag file: {}", name);
            let path = format!("{}/{}", ROSBAG_DIR_NAME, name);
            let data = self.storage.read_file(&path).await?;
            let reader = BagReader::from_bytes(data, name)?;
            let sequences = bag_to_sequences(&reader, &topics)?;
            records.push(BagRecord {
                bag_name: name.clone(),
                sequences,
            });
        }

        if records.is_empty() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "no .bag files under '{}/' for project '{}'",
                    ROSBAG_DIR_NAME,
                    self.config.project_name()
                ),
            });
        }
        Ok(records)
    }

    async fn transform(&self, data: Vec<BagRecord>) -> Result<TransformResult> {
        let converter = VersatileConverter::from_settings(&self.config);
        let rule = AllSameRule::new(NearestNeighbour::default());
        let period = self.config.sampling_period();

        let mut episodes = Vec::with_capacity(data.len());
        for bag in data {
            tracing::debug!(
                "Synchronizing {} topics from {} at {} Hz",
                bag.sequences.len(),
                bag.bag_name,
                self.config.sampling_hz()
            );

            let (t_start, t_end) = union_time_bound(&bag.sequences)?;
            let n_bins = bin_count(t_start, t_end, period);
            let mut tables: Vec<Vec<Option<usize>>> = bag
                .sequences
                .iter()
                .map(|seq| pack_to_bins(seq, t_start, period, n_bins))
                .collect();
            rule.apply(&bag.sequences, t_start, period, &mut tables);
            let synced = synchronize_binned(&bag.sequences, &tables, t_start, period)?;

            let times = synced
                .first()
                .map(|seq| seq.time_list.clone())
                .unwrap_or_default();

            let mut sequences = Vec::with_capacity(synced.len());
            for seq in &synced {
                let elements: Vec<Element> = seq
                    .object_list
                    .iter()
                    .map(|msg| converter.convert(msg))
                    .collect::<Result<_>>()?;
                let kind = elements
                    .first()
                    .map(Element::kind)
                    .ok_or_else(|| EtlError::ProcessingError {
                        message: format!("topic '{}' synchronized to zero frames", seq.topic_name),
                    })?;
                sequences.push(ElementSequence {
                    topic_name: seq.topic_name.clone(),
                    kind,
                    elements,
                });
            }

            tracing::debug!("Episode {} has {} frames", bag.bag_name, times.len());
            episodes.push(EpisodeData {
                bag_name: bag.bag_name,
                times,
                sequences,
            });
        }

        Ok(TransformResult { episodes })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let metadata = BundleMetadata {
            project: self.config.project_name().to_string(),
            created_at: chrono::Utc::now(),
            sampling_hz: self.config.sampling_hz(),
            control_joints: self.config.control_joints().to_vec(),
            episodes: result.episodes.iter().map(Self::episode_metadata).collect(),
        };

        tracing::debug!(
            "Writing bundle with {} episodes to {}",
            result.episodes.len(),
            self.config.bundle_filename()
        );

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("metadata.json", FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;

            for (i, episode) in result.episodes.iter().enumerate() {
                let prefix = format!("episode_{:03}", i);
                for seq in &episode.sequences {
                    match seq.kind {
                        ElementKind::RgbImage => {
                            zip.start_file::<_, ()>(
                                format!("{}/rgb.bin", prefix),
                                FileOptions::default(),
                            )?;
                            for element in &seq.elements {
                                if let Element::Rgb(img) = element {
                                    zip.write_all(&img.data)?;
                                }
                            }
                        }
                        ElementKind::DepthImage => {
                            zip.start_file::<_, ()>(
                                format!("{}/depth.bin", prefix),
                                FileOptions::default(),
                            )?;
                            for element in &seq.elements {
                                if let Element::Depth(img) = element {
                                    for value in &img.data {
                                        zip.write_all(&value.to_le_bytes())?;
                                    }
                                }
                            }
                        }
                        ElementKind::AngleVector => {
                            zip.start_file::<_, ()>(
                                format!("{}/angles.csv", prefix),
                                FileOptions::default(),
                            )?;
                            zip.write_all(&self.angles_csv(episode, seq)?)?;
                        }
                    }
                }
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Bundle is {} bytes", zip_data.len());
        self.storage
            .write_file(self.config.bundle_filename(), &zip_data)
            .await?;

        Ok(self.config.bundle_filename().to_string())
    }
}
