//! 工具执行器
//!
//! 持有 ToolBox 与全局超时，execute(name, args) 先解析为封闭枚举再分发，
//! 超时或失败时转为 AgentError（ToolTimeout / ToolExecutionFailed）；
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::{ToolBox, ToolInvocation, ToolSpec};

/// 工具执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ToolExecutor {
    toolbox: ToolBox,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(toolbox: ToolBox, timeout_secs: u64) -> Self {
        Self {
            toolbox,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.toolbox.specs()
    }

    /// 执行指定工具；解析失败转 ToolExecutionFailed，超时返回 ToolTimeout；输出 JSON 审计日志
    pub async fn execute(
        &self,
        tool_name: &str,
        args: &serde_json::Value,
    ) -> Result<String, AgentError> {
        let start = Instant::now();
        let args_preview = args_preview(args);

        let result = match ToolInvocation::parse(tool_name, args) {
            Ok(invocation) => match timeout(self.timeout, self.toolbox.execute(invocation)).await {
                Ok(inner) => inner,
                Err(_) => Err(AgentError::ToolTimeout(tool_name.to_string())),
            },
            Err(e) => Err(AgentError::ToolExecutionFailed(e)),
        };

        let (ok, outcome): (bool, &str) = match &result {
            Ok(_) => (true, "ok"),
            Err(AgentError::ToolTimeout(_)) => (false, "timeout"),
            Err(_) => (false, "error"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        result
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
