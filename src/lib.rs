pub mod config;
pub mod core;
pub mod domain;
pub mod rosbag;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::cli::LocalStorage;
pub use config::toml_config::TomlConfig;
pub use core::{etl::EtlEngine, pipeline::BagPipeline};
pub use utils::error::{EtlError, Result};
