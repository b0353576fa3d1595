use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed bag file '{path}': {reason}")]
    BagFormatError { path: String, reason: String },

    #[error("Bag chunk uses unsupported compression '{compression}'")]
    UnsupportedCompressionError { compression: String },

    #[error("Failed to decode {datatype} message: {reason}")]
    MessageDecodeError { datatype: String, reason: String },

    #[error("Topic '{topic}' has no messages in '{path}'")]
    TopicMissingError { topic: String, path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

/// 錯誤嚴重程度，用於決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// 錯誤分類，方便日誌歸類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    BagFormat,
    Processing,
    System,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,

            EtlError::BagFormatError { .. }
            | EtlError::UnsupportedCompressionError { .. }
            | EtlError::MessageDecodeError { .. }
            | EtlError::TopicMissingError { .. } => ErrorCategory::BagFormat,

            EtlError::ProcessingError { .. } | EtlError::CsvError(_) => ErrorCategory::Processing,

            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::TopicMissingError { .. } => ErrorSeverity::Medium,

            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::BagFormatError { .. }
            | EtlError::UnsupportedCompressionError { .. }
            | EtlError::MessageDecodeError { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::CsvError(_) => ErrorSeverity::High,

            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 給使用者看的簡短訊息（不含內部細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ConfigValidationError { field, .. }
            | EtlError::InvalidConfigValueError { field, .. }
            | EtlError::MissingConfigError { field } => {
                format!("Configuration problem in '{}'", field)
            }
            EtlError::BagFormatError { path, .. } => {
                format!("Bag file '{}' could not be read", path)
            }
            EtlError::UnsupportedCompressionError { compression } => {
                format!("Bag was recorded with '{}' compression", compression)
            }
            EtlError::TopicMissingError { topic, path } => {
                format!("Topic '{}' was not recorded in '{}'", topic, path)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Check the project TOML config against the sample in the README".to_string()
            }
            EtlError::UnsupportedCompressionError { .. } => {
                "Re-record the bag without compression, or run `rosbag decompress` first"
                    .to_string()
            }
            EtlError::TopicMissingError { topic, .. } => {
                format!("Verify that '{}' was being published during recording", topic)
            }
            EtlError::ProcessingError { .. } => {
                "Try a lower sampling frequency so every bin receives a message".to_string()
            }
            EtlError::BagFormatError { .. } | EtlError::MessageDecodeError { .. } => {
                "Confirm the bag was produced by `rosbag record` and is not truncated".to_string()
            }
            _ => "Check file permissions and available disk space".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
