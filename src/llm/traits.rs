//! LLM 客户端抽象
//!
//! 推理调用被视作不透明能力：complete(system, messages, tools) 返回一条
//! 完整的 assistant 消息（可携带 tool_calls）。tools 为 None 时禁用工具调用
//! （rewrite / plan 节点）。

use async_trait::async_trait;

use crate::memory::Message;
use crate::tools::ToolSpec;

/// LLM 客户端 trait：单次非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 调用模型，返回 assistant 消息；失败返回错误文本（由执行器转为 ReasoningFailure）
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<Message, String>;
}
