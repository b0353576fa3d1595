use crate::domain::model::{CropRegion, FilterSpec};
use crate::domain::ports::ProjectSettings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_BUNDLE_FILENAME: &str = "bundle.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub project: ProjectConfig,
    pub topics: TopicsConfig,
    pub sampling: SamplingConfig,
    pub control: ControlConfig,
    pub filter: Option<FilterConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    pub rgb: String,
    pub depth: Option<String>,
    pub joint_states: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub hz: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    pub joints: Vec<String>,
    /// Joint name → angle the operator tooling drives the robot to between
    /// demonstrations. Not used by the pipeline itself.
    pub home_position: Option<HashMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub crop: Option<CropConfig>,
    pub resolution: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub bundle_filename: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TEACH_PROJECT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("valid literal pattern");

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("project.name", &self.project.name)?;

        validation::validate_topic_name("topics.rgb", &self.topics.rgb)?;
        validation::validate_topic_name("topics.joint_states", &self.topics.joint_states)?;
        if let Some(depth) = &self.topics.depth {
            validation::validate_topic_name("topics.depth", depth)?;
        }

        validation::validate_range("sampling.hz", self.sampling.hz, 0.1, 100.0)?;

        if self.control.joints.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "control.joints".to_string(),
            });
        }
        for joint in &self.control.joints {
            validation::validate_non_empty_string("control.joints", joint)?;
        }

        if let Some(filter) = &self.filter {
            if let Some(resolution) = filter.resolution {
                validation::validate_positive_number("filter.resolution", resolution, 1)?;
            }
            if let Some(crop) = &filter.crop {
                if crop.x_min >= crop.x_max || crop.y_min >= crop.y_max {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "filter.crop".to_string(),
                        value: format!(
                            "({},{})..({},{})",
                            crop.x_min, crop.y_min, crop.x_max, crop.y_max
                        ),
                        reason: "Crop bounds must satisfy min < max on both axes".to_string(),
                    });
                }
            }
        }

        if let Some(output) = &self.output {
            if let Some(filename) = &output.bundle_filename {
                validation::validate_path("output.bundle_filename", filename)?;
            }
        }

        Ok(())
    }

    /// 取得每個 bin 的寬度（秒）
    pub fn period(&self) -> f64 {
        1.0 / self.sampling.hz
    }
}

impl ProjectSettings for TomlConfig {
    fn project_name(&self) -> &str {
        &self.project.name
    }

    fn rgb_topic(&self) -> &str {
        &self.topics.rgb
    }

    fn depth_topic(&self) -> Option<&str> {
        self.topics.depth.as_deref()
    }

    fn joint_topic(&self) -> &str {
        &self.topics.joint_states
    }

    fn sampling_hz(&self) -> f64 {
        self.sampling.hz
    }

    fn control_joints(&self) -> &[String] {
        &self.control.joints
    }

    fn image_filter(&self) -> Option<FilterSpec> {
        self.filter.as_ref().map(|f| FilterSpec {
            crop: f.crop.as_ref().map(|c| CropRegion {
                x_min: c.x_min,
                x_max: c.x_max,
                y_min: c.y_min,
                y_max: c.y_max,
            }),
            resolution: f.resolution,
        })
    }

    fn bundle_filename(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.bundle_filename.as_deref())
            .unwrap_or(DEFAULT_BUNDLE_FILENAME)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
