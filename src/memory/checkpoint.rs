//! 会话检查点存储
//!
//! 按会话 ID 持久化 TurnState，使新的进程/调用能续接已有对话而不是重新开始。
//! 文件实现：每个会话一个 JSON 文件；load 时文件缺失或损坏都降级为全新会话
//! （记录 warning，接受可能的静默历史丢失），保证用户永远不会被持久层卡住。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::graph::TurnState;

/// 检查点存储接口：save 成功后，同 key 的 load 必须能观察到保存的状态
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// 加载会话状态；不存在（或无法解析）时返回 None，由调用方初始化默认状态
    async fn load(&self, session_id: &str) -> Result<Option<TurnState>, AgentError>;

    /// 保存会话状态（整文件替换）
    async fn save(&self, session_id: &str, state: &TurnState) -> Result<(), AgentError>;
}

/// 磁盘上的检查点记录：状态 + 保存时间
#[derive(Serialize, Deserialize)]
struct CheckpointRecord {
    session_id: String,
    saved_at: String,
    state: TurnState,
}

/// 文件检查点存储：<dir>/<session_id>.json
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_session_id(session_id)))
    }
}

/// 会话 ID 用作文件名：字母数字与 - 原样保留，其余字节（含 _ 本身）
/// 转义为 _XX 十六进制。转义可逆，不同 ID 不会映射到同一文件。
fn sanitize_session_id(session_id: &str) -> String {
    if session_id.is_empty() {
        // 裸 _ 不会由任何非空 ID 产生
        return "_".to_string();
    }
    let mut out = String::with_capacity(session_id.len());
    for b in session_id.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => out.push(b as char),
            other => out.push_str(&format!("_{:02X}", other)),
        }
    }
    out
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<TurnState>, AgentError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .map_err(|e| AgentError::PersistenceFailure(e.to_string()))?;
        match serde_json::from_str::<CheckpointRecord>(&data) {
            Ok(record) => Ok(Some(record.state)),
            Err(e) => {
                // 损坏的检查点不致命：当作全新会话
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Corrupt checkpoint, starting fresh session"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, session_id: &str, state: &TurnState) -> Result<(), AgentError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AgentError::PersistenceFailure(e.to_string()))?;
        let record = CheckpointRecord {
            session_id: session_id.to_string(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| AgentError::PersistenceFailure(e.to_string()))?;
        std::fs::write(self.path_for(session_id), json)
            .map_err(|e| AgentError::PersistenceFailure(e.to_string()))?;
        Ok(())
    }
}
