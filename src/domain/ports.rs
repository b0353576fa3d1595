use crate::domain::model::{BagRecord, FilterSpec, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// List file names (not paths) directly under `dir`, sorted.
    fn list_files(&self, dir: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Read-side of the project configuration, as the pipeline needs it.
pub trait ProjectSettings: Send + Sync {
    fn project_name(&self) -> &str;
    fn rgb_topic(&self) -> &str;
    fn depth_topic(&self) -> Option<&str>;
    fn joint_topic(&self) -> &str;
    fn sampling_hz(&self) -> f64;
    fn control_joints(&self) -> &[String];
    fn image_filter(&self) -> Option<FilterSpec>;
    fn bundle_filename(&self) -> &str;

    fn topic_list(&self) -> Vec<String> {
        let mut topics = vec![self.rgb_topic().to_string()];
        if let Some(depth) = self.depth_topic() {
            topics.push(depth.to_string());
        }
        topics.push(self.joint_topic().to_string());
        topics
    }

    /// Bin width of the synchronization grid, in seconds.
    fn sampling_period(&self) -> f64 {
        1.0 / self.sampling_hz()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<BagRecord>>;
    async fn transform(&self, data: Vec<BagRecord>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
