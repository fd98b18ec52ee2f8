//! 对话消息类型
//!
//! Message 是对话历史的最小单元（role + content），assistant 消息可携带
//! tool_calls，tool 消息通过 tool_call_id 关联到发起它的那次调用。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// assistant 消息中的一次工具调用请求
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// 调用 ID，工具结果消息通过 tool_call_id 回链
    pub id: String,
    /// 工具名（封闭集合：create_folder / create_code_file / delete_folder / delete_file / run_project）
    pub name: String,
    /// JSON 参数
    pub arguments: serde_json::Value,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// 仅 assistant 消息使用；为空表示本条不请求任何工具
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// 仅 tool 消息使用：对应 assistant 消息中某个 ToolCall 的 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// 携带工具调用请求的 assistant 消息
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// 工具结果消息，tool_call_id 指向发起调用的 ToolCall
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// 是否请求了至少一个工具调用
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_links_call_id() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "create_folder".to_string(),
            arguments: serde_json::json!({"folder_name": "demo"}),
        };
        let assistant = Message::assistant_with_tools("", vec![call]);
        let result = Message::tool("Folder created", "call_1");
        assert!(assistant.has_tool_calls());
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn serde_round_trip() {
        let msg = Message::assistant_with_tools(
            "working on it",
            vec![ToolCall {
                id: "call_9".to_string(),
                name: "run_project".to_string(),
                arguments: serde_json::json!({}),
            }],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn plain_message_serializes_without_tool_fields() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
    }
}
