pub mod executor;
pub mod preview;
pub mod registry;
pub mod sandbox;

pub use executor::ToolExecutor;
pub use preview::PreviewServer;
pub use registry::{ToolBox, ToolInvocation, ToolSpec};
pub use sandbox::Workspace;
