//! Agent 错误类型
//!
//! 传播策略：只有 ReasoningFailure 作为整轮失败上抛；沙箱 / 工具错误
//! 一律转为工具结果文本写回对话，让模型自行纠正；持久化错误降级为警告。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误（路径逃逸、推理失败、持久化等）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 目标路径在规范化后落在沙箱根目录之外，操作被拒绝且不触碰文件系统
    #[error("Path escape attempt: {0}")]
    PathEscape(String),

    /// 删除目标不存在（非致命，作为工具结果反馈给模型）
    #[error("Not found: {0}")]
    NotFound(String),

    /// 上游推理调用失败（超时、网络、畸形输出）：中止当前轮，会话状态回滚
    #[error("Reasoning call failed: {0}")]
    ReasoningFailure(String),

    /// 检查点读写失败：load 时降级为全新会话，save 时仅告警
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),
}
