//! 轮次过程事件：供控制台 / 语音适配器按序消费
//!
//! 核心只保证事件顺序，不保证投递机制；通道由调用方选择（可不传）。

use serde::Serialize;

use crate::graph::Node;

/// 单轮过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// 进入某个处理节点
    NodeEntered { node: Node },
    /// rewrite 节点产出的澄清指令
    Rewritten { text: String },
    /// plan 节点产出的内部计划
    Planned { text: String },
    /// 调用工具
    ToolInvoked {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    ToolCompleted { tool: String, preview: String },
    /// 最终回复
    AssistantMessage { text: String },
    /// 错误（推理失败等）
    Error { text: String },
}

/// 事件发送：未接通道时静默丢弃
pub(crate) fn send_event(
    tx: &Option<&tokio::sync::mpsc::UnboundedSender<TurnEvent>>,
    ev: TurnEvent,
) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}
