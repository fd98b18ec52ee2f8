//! Wren - Rust 语音编码助手智能体
//!
//! 模块划分：
//! - **agent**: 无头 Agent 运行时（会话锁 + 加载/执行/保存一轮对话）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **graph**: 图执行器（Rewrite -> Plan -> Chatbot -> Tools 状态机）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Scripted Mock）
//! - **memory**: 消息类型与会话检查点存储
//! - **tools**: 沙箱文件系统工具（封闭枚举分发）与预览服务器
//!
//! 语音输入输出（麦克风 / STT / TTS）不在本 crate 范围内：外部适配器
//! 提供一条文本指令，消费一轮对话的最终回复。

pub mod agent;
pub mod config;
pub mod core;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;

pub use agent::{Agent, TurnOutcome};
