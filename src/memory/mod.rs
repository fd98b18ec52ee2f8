pub mod checkpoint;
pub mod message;

pub use checkpoint::{CheckpointStore, FileCheckpointStore};
pub use message::{Message, Role, ToolCall};
