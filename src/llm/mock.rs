//! Scripted Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序回放预置的 assistant 消息，并记录每次调用是否启用了工具，
//! 便于断言状态机的节点序列（rewrite / plan 无工具，chatbot 有工具）。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, ToolCall};
use crate::tools::ToolSpec;

/// 脚本化客户端：complete 每次弹出一条预置回复；脚本耗尽返回错误
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Message>>,
    /// 每次调用的 tools_enabled 标记（按调用顺序）
    calls: Mutex<Vec<bool>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 便捷构造：一条纯文本 assistant 回复
    pub fn reply(text: impl Into<String>) -> Message {
        Message::assistant(text)
    }

    /// 便捷构造：一条携带工具调用的 assistant 回复，id 自动生成
    pub fn tool_call_reply(calls: Vec<(&str, serde_json::Value)>) -> Message {
        let tool_calls = calls
            .into_iter()
            .map(|(name, arguments)| ToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4()),
                name: name.to_string(),
                arguments,
            })
            .collect();
        Message::assistant_with_tools("", tool_calls)
    }

    /// 每次调用的 tools_enabled 标记
    pub fn tools_enabled_log(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<Message, String> {
        self.calls.lock().unwrap().push(tools.is_some());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "Scripted replies exhausted".to_string())
    }
}
