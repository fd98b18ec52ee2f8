//! 无头 Agent 运行时
//!
//! 供控制台 / 语音等前端调用的无界面逻辑：按会话 ID 加载检查点、
//! 驱动图执行器跑完一轮、保存检查点并返回最终回复与工具事件。
//! 同一会话的轮次经会话锁严格串行；不同会话可完全并行。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::core::AgentError;
use crate::graph::{GraphExecutor, TurnEvent, TurnState};
use crate::llm::{LlmClient, OpenAiClient};
use crate::memory::{CheckpointStore, FileCheckpointStore};
use crate::tools::{PreviewServer, ToolBox, ToolExecutor, Workspace};

pub use crate::graph::{ToolEvent, TurnOutcome};

/// Agent：图执行器 + 检查点存储 + 会话锁表
pub struct Agent {
    graph: GraphExecutor,
    checkpoints: Arc<dyn CheckpointStore>,
    /// 会话 ID -> 咨询锁；保证同一会话不会有两轮并发在途
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Agent {
    /// 按配置组装：OpenAI 兼容主/辅模型、沙箱工具箱、文件检查点存储
    pub fn from_config(cfg: &AppConfig) -> Self {
        let base_url = cfg.llm.base_url.as_deref();
        let chat_llm: Arc<dyn LlmClient> =
            Arc::new(OpenAiClient::new(base_url, &cfg.llm.model, None));
        let helper_llm: Arc<dyn LlmClient> =
            Arc::new(OpenAiClient::new(base_url, &cfg.llm.helper_model, None));

        let workspace = Workspace::new(cfg.workspace_root());
        let preview = PreviewServer::new(workspace.clone(), cfg.preview.port);
        let executor = ToolExecutor::new(
            ToolBox::new(workspace, preview),
            cfg.tools.tool_timeout_secs,
        );

        Self::new(
            GraphExecutor::new(chat_llm, helper_llm, executor),
            Arc::new(FileCheckpointStore::new(cfg.checkpoint_dir())),
        )
    }

    pub fn new(graph: GraphExecutor, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            graph,
            checkpoints,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 处理一轮：加载（或初始化）会话状态 -> 跑图 -> 保存
    ///
    /// 加载失败降级为全新会话；保存失败仅告警，不影响本轮的内存结果。
    /// 只有 ReasoningFailure 作为错误上抛，此时检查点保持轮前状态。
    pub async fn run_turn(
        &self,
        session_id: &str,
        user_text: &str,
        event_tx: Option<&UnboundedSender<TurnEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut state = match self.checkpoints.load(session_id).await {
            Ok(Some(state)) => state,
            Ok(None) => TurnState::default(),
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Checkpoint load failed, starting fresh session"
                );
                TurnState::default()
            }
        };

        let outcome = self.graph.run_turn(&mut state, user_text, event_tx).await?;

        if let Err(e) = self.checkpoints.save(session_id, &state).await {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Checkpoint save failed, turn result kept in memory only"
            );
        }

        Ok(outcome)
    }
}
