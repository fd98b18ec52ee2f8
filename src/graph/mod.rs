pub mod engine;
pub mod events;
pub mod prompts;
pub mod state;

pub use engine::{GraphExecutor, ToolEvent, TurnOutcome};
pub use events::TurnEvent;
pub use state::{Node, TurnState};
