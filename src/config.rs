//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WREN__*` 覆盖（双下划线表示嵌套，
//! 如 `WREN__LLM__MODEL=gpt-4.1`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub preview: PreviewSection,
}

/// [app] 段：沙箱根目录与检查点目录
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 沙箱根目录，所有文件/文件夹操作限制在此目录下；未设置时用 ./workspace
    pub workspace_root: Option<PathBuf>,
    /// 会话检查点目录，未设置时用 <workspace_root>/.sessions
    pub checkpoint_dir: Option<PathBuf>,
    /// 未显式指定时 REPL 使用的会话 ID
    #[serde(default = "default_session_id")]
    pub default_session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

/// [llm] 段：端点、主模型（带工具）与辅助模型（rewrite / plan，无工具）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmSection {
    pub base_url: Option<String>,
    /// 工具调用模型
    #[serde(default = "default_model")]
    pub model: String,
    /// rewrite / plan 节点使用的轻量模型
    #[serde(default = "default_helper_model")]
    pub helper_model: String,
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_helper_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// [tools] 段：单次工具调用超时
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// [preview] 段：run_project 启动的静态文件服务器端口
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewSection {
    #[serde(default = "default_preview_port")]
    pub port: u16,
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            port: default_preview_port(),
        }
    }
}

fn default_preview_port() -> u16 {
    8000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            tools: ToolsSection::default(),
            preview: PreviewSection::default(),
        }
    }
}

impl AppConfig {
    /// 沙箱根目录（默认 ./workspace）
    pub fn workspace_root(&self) -> PathBuf {
        self.app
            .workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("workspace"))
    }

    /// 检查点目录（默认 <workspace_root>/.sessions）
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.app
            .checkpoint_dir
            .clone()
            .unwrap_or_else(|| self.workspace_root().join(".sessions"))
    }
}

/// 从 config 目录加载配置，环境变量 WREN__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WREN__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WREN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
