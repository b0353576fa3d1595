pub mod format;
pub mod messages;
pub mod reader;
#[cfg(test)]
pub(crate) mod testkit;

pub use messages::{ImageMessage, JointStateMessage, IMAGE_DATATYPE, JOINT_STATE_DATATYPE};
pub use reader::{bag_to_sequences, BagReader, BagSummary, Connection, TopicSummary};
