use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of a project that holds the recorded bag files.
pub const ROSBAG_DIR_NAME: &str = "rosbags";

pub fn project_dir(base_dir: &Path, project_name: &str) -> PathBuf {
    base_dir.join(project_name)
}

pub fn rosbag_dir(base_dir: &Path, project_name: &str) -> PathBuf {
    project_dir(base_dir, project_name).join(ROSBAG_DIR_NAME)
}

pub fn create_if_not_exist(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// List `.bag` files directly under `dir`, sorted by filename so that
/// episode ordering is stable between runs.
pub fn list_bag_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut bags = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("bag") {
            bags.push(path);
        }
    }
    bags.sort();
    Ok(bags)
}
