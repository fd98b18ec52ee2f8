//! 图执行状态
//!
//! TurnState 是贯穿整个图的数据结构：对话历史 + 两个派生草稿字段。
//! 草稿字段（rewritten_instruction / plan）每轮覆盖重写，只用于条件化
//! 下一次模型调用，从不作为对话内容展示给用户。

use serde::{Deserialize, Serialize};

use crate::memory::Message;

/// 处理节点（状态机状态）；初始 Rewrite，终止 End
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Rewrite,
    Plan,
    Chatbot,
    Tools,
    End,
}

/// 一轮对话贯穿图的状态；按会话 ID 持久化
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    /// 对话历史，追加写入，顺序即模型上下文顺序
    pub messages: Vec<Message>,
    /// 最新用户消息的澄清重写；每轮覆盖，不保留历史
    pub rewritten_instruction: Option<String>,
    /// 最新的简短计划（有序步骤）；每轮覆盖
    pub plan: Option<String>,
}

impl TurnState {
    /// 最近一条用户消息的内容（本轮的原始指令）
    pub fn latest_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::memory::Role::User)
            .map(|m| m.content.as_str())
    }

    /// 最近一条 assistant 消息的内容（一轮结束后即最终回复）
    pub fn latest_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::memory::Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
