pub mod convert;
pub mod etl;
pub mod interpolate;
pub mod pipeline;
pub mod sync;

pub use crate::domain::model::{BagRecord, EpisodeData, TransformResult};
pub use crate::domain::ports::{Pipeline, ProjectSettings, Storage};
pub use crate::utils::error::Result;
