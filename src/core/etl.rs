use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs the three stages in order; the first failure fails the run.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting bag ETL process...");

        tracing::info!("Extracting topic sequences from bags...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} bags", raw_data.len());
        self.monitor.log_stats("Extract");

        tracing::info!("Synchronizing and converting...");
        let transformed = self.pipeline.transform(raw_data).await?;
        let frames: usize = transformed.episodes.iter().map(|e| e.frame_count()).sum();
        tracing::info!(
            "Built {} episodes ({} frames total)",
            transformed.episodes.len(),
            frames
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing bundle...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Bundle saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
