//! 工具集合（封闭枚举）
//!
//! 五个工具作为带类型参数的枚举变体，解析用 serde、分发用穷举 match：
//! 新增工具是编译期检查的改动，不存在运行时反射。ToolSpec 携带
//! 名称 / 描述 / 参数 JSON Schema，供 LLM 的 function calling 使用。

use serde::Deserialize;
use serde_json::Value;

use crate::core::AgentError;
use crate::tools::{PreviewServer, Workspace};

/// 提供给 LLM 的工具声明
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 一次已解析的工具调用（封闭集合，参数已类型化）
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    CreateFolder {
        folder_name: String,
    },
    CreateCodeFile {
        filename: String,
        content: String,
        folder_name: Option<String>,
    },
    DeleteFolder {
        folder_name: String,
    },
    DeleteFile {
        filename: String,
        folder_name: Option<String>,
    },
    RunProject,
}

#[derive(Deserialize)]
struct FolderArgs {
    folder_name: String,
}

#[derive(Deserialize)]
struct CreateFileArgs {
    filename: String,
    content: String,
    #[serde(default)]
    folder_name: Option<String>,
}

#[derive(Deserialize)]
struct DeleteFileArgs {
    filename: String,
    #[serde(default)]
    folder_name: Option<String>,
}

impl ToolInvocation {
    /// 按名称解析参数；未知工具名或参数不合法时返回错误文本
    /// （非致命：由调用方作为工具结果反馈给模型）
    pub fn parse(name: &str, args: &Value) -> Result<Self, String> {
        match name {
            "create_folder" => {
                let a: FolderArgs = parse_args(name, args)?;
                Ok(Self::CreateFolder {
                    folder_name: a.folder_name,
                })
            }
            "create_code_file" => {
                let a: CreateFileArgs = parse_args(name, args)?;
                Ok(Self::CreateCodeFile {
                    filename: a.filename,
                    content: a.content,
                    folder_name: a.folder_name,
                })
            }
            "delete_folder" => {
                let a: FolderArgs = parse_args(name, args)?;
                Ok(Self::DeleteFolder {
                    folder_name: a.folder_name,
                })
            }
            "delete_file" => {
                let a: DeleteFileArgs = parse_args(name, args)?;
                Ok(Self::DeleteFile {
                    filename: a.filename,
                    folder_name: a.folder_name,
                })
            }
            "run_project" => Ok(Self::RunProject),
            other => Err(format!("Unknown tool: {}", other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateFolder { .. } => "create_folder",
            Self::CreateCodeFile { .. } => "create_code_file",
            Self::DeleteFolder { .. } => "delete_folder",
            Self::DeleteFile { .. } => "delete_file",
            Self::RunProject => "run_project",
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(name: &str, args: &Value) -> Result<T, String> {
    serde_json::from_value::<T>(args.clone())
        .map_err(|e| format!("Invalid arguments for {}: {}", name, e))
}

/// 工具箱：持有沙箱与预览服务器，execute 对枚举穷举分发
pub struct ToolBox {
    workspace: Workspace,
    preview: PreviewServer,
}

impl ToolBox {
    pub fn new(workspace: Workspace, preview: PreviewServer) -> Self {
        Self { workspace, preview }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// 执行一次工具调用，返回面向模型的可读结果文本
    pub async fn execute(&self, invocation: ToolInvocation) -> Result<String, AgentError> {
        self.workspace.ensure_root()?;
        match invocation {
            ToolInvocation::CreateFolder { folder_name } => {
                let path = self.workspace.create_folder(&folder_name)?;
                Ok(format!("Folder created at {}", path.display()))
            }
            ToolInvocation::CreateCodeFile {
                filename,
                content,
                folder_name,
            } => {
                let path =
                    self.workspace
                        .write_file(&filename, &content, folder_name.as_deref())?;
                Ok(format!("File created/updated at {}", path.display()))
            }
            ToolInvocation::DeleteFolder { folder_name } => {
                let path = self.workspace.delete_folder(&folder_name)?;
                Ok(format!("Folder {} has been deleted", path.display()))
            }
            ToolInvocation::DeleteFile {
                filename,
                folder_name,
            } => {
                let path = self
                    .workspace
                    .delete_file(&filename, folder_name.as_deref())?;
                Ok(format!("File {} has been deleted", path.display()))
            }
            ToolInvocation::RunProject => {
                let url = self.preview.ensure_running().await?;
                Ok(format!("Project server running at {}", url))
            }
        }
    }

    /// 五个工具的声明列表（顺序固定，便于测试与 prompt 稳定）
    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "create_folder".to_string(),
                description: "Create a project folder inside the workspace with the given name."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "folder_name": {
                            "type": "string",
                            "description": "Folder name, e.g. netflix_landing"
                        }
                    },
                    "required": ["folder_name"]
                }),
            },
            ToolSpec {
                name: "create_code_file".to_string(),
                description: "Create or overwrite a code file inside the workspace (or a project folder) with the given content."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "filename": {
                            "type": "string",
                            "description": "File name, e.g. index.html"
                        },
                        "content": {
                            "type": "string",
                            "description": "Full file content to write"
                        },
                        "folder_name": {
                            "type": "string",
                            "description": "Optional project folder under the workspace"
                        }
                    },
                    "required": ["filename", "content"]
                }),
            },
            ToolSpec {
                name: "delete_folder".to_string(),
                description: "Delete a project folder inside the workspace and all of its contents."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "folder_name": {
                            "type": "string",
                            "description": "Folder to delete"
                        }
                    },
                    "required": ["folder_name"]
                }),
            },
            ToolSpec {
                name: "delete_file".to_string(),
                description: "Delete a file inside the workspace (or a project folder)."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "filename": {
                            "type": "string",
                            "description": "File to delete"
                        },
                        "folder_name": {
                            "type": "string",
                            "description": "Optional project folder under the workspace"
                        }
                    },
                    "required": ["filename"]
                }),
            },
            ToolSpec {
                name: "run_project".to_string(),
                description: "Start a local HTTP server serving the workspace and return its base URL. No arguments."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
        ]
    }
}
