pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::ScriptedLlm;
pub use openai::OpenAiClient;
pub use traits::LlmClient;
