//! 预览服务器
//!
//! run_project 工具启动的后台静态文件服务器：axum + ServeDir 提供沙箱根目录，
//! fire-and-forget（tokio::spawn），生命周期独立于任何一轮对话，随进程退出。
//! 服务器已在运行时重复调用为幂等 no-op，返回已有地址。

use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use crate::core::AgentError;
use crate::tools::Workspace;

/// 预览服务器句柄：最多启动一次，之后复用地址
#[derive(Clone)]
pub struct PreviewServer {
    workspace: Workspace,
    port: u16,
    /// 已启动服务器的 base URL；None 表示尚未启动
    url: Arc<Mutex<Option<String>>>,
}

impl PreviewServer {
    /// port 为 0 时由系统分配空闲端口（测试用）
    pub fn new(workspace: Workspace, port: u16) -> Self {
        Self {
            workspace,
            port,
            url: Arc::new(Mutex::new(None)),
        }
    }

    /// 确保服务器在运行，返回 base URL；已在运行时直接返回已有地址
    pub async fn ensure_running(&self) -> Result<String, AgentError> {
        let mut url = self.url.lock().await;
        if let Some(existing) = url.as_ref() {
            return Ok(existing.clone());
        }

        self.workspace.ensure_root()?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|e| {
                AgentError::ToolExecutionFailed(format!("Preview server bind failed: {}", e))
            })?;
        let addr = listener.local_addr().map_err(|e| {
            AgentError::ToolExecutionFailed(format!("Preview server addr failed: {}", e))
        })?;

        let app = Router::new().fallback_service(ServeDir::new(self.workspace.root()));
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Preview server exited");
            }
        });

        let base = format!("http://{}", addr);
        tracing::info!(url = %base, "Preview server started");
        *url = Some(base.clone());
        Ok(base)
    }

    /// 当前地址（未启动时为 None）
    pub async fn current_url(&self) -> Option<String> {
        self.url.lock().await.clone()
    }
}
