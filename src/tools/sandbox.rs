//! 沙箱文件系统
//!
//! Workspace 绑定 root 目录，所有路径经 resolve 词法校验必须在 root 下
//! （禁止绝对路径与 ../ 逃逸）。目标可能尚不存在（先创建后使用的工具），
//! 因此用组件级词法检查而不是 canonicalize。校验失败时不做任何文件系统变更。

use std::path::{Component, Path, PathBuf};

use crate::core::AgentError;

/// 沙箱文件系统：创建 / 写入 / 删除都限制在根目录下
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 确保根目录存在；幂等
    pub fn ensure_root(&self) -> Result<(), AgentError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Create root failed: {}", e)))
    }

    /// 将相对名称解析为根目录下的绝对路径
    ///
    /// 拒绝空名称、绝对路径、盘符前缀与任何 `..` 组件；允许 `a/b` 形式的
    /// 正常嵌套。只做词法检查，不触碰文件系统。
    pub fn resolve(&self, name: &str) -> Result<PathBuf, AgentError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AgentError::ToolExecutionFailed("Empty path".to_string()));
        }
        // 反斜杠在 Unix 上会被当作普通文件名字符，统一按分隔符拒绝处理
        if name.contains('\\') {
            return Err(AgentError::PathEscape(name.to_string()));
        }
        let mut resolved = self.root.clone();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AgentError::PathEscape(name.to_string())); // 如 ../../etc/passwd
                }
            }
        }
        if resolved == self.root {
            return Err(AgentError::ToolExecutionFailed("Empty path".to_string()));
        }
        Ok(resolved)
    }

    /// 文件路径解析：可选 folder 前缀 + 文件名，两段各自校验
    fn resolve_file(&self, filename: &str, folder: Option<&str>) -> Result<PathBuf, AgentError> {
        match folder {
            Some(f) if !f.trim().is_empty() => {
                let dir = self.resolve(f)?;
                let file = self.resolve(filename)?;
                // filename 自身已通过校验，拼到 folder 下仍然在根内
                let rel = file.strip_prefix(&self.root).unwrap_or(&file);
                Ok(dir.join(rel))
            }
            _ => self.resolve(filename),
        }
    }

    /// 创建文件夹；已存在时幂等，返回解析后的路径
    pub fn create_folder(&self, name: &str) -> Result<PathBuf, AgentError> {
        let path = self.resolve(name)?;
        std::fs::create_dir_all(&path)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Create folder failed: {}", e)))?;
        Ok(path)
    }

    /// 写入/覆盖文件（整文件替换，不追加）；父目录不存在时自动创建
    pub fn write_file(
        &self,
        filename: &str,
        content: &str,
        folder: Option<&str>,
    ) -> Result<PathBuf, AgentError> {
        let path = self.resolve_file(filename, folder)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgentError::ToolExecutionFailed(format!("Create parent failed: {}", e))
            })?;
        }
        std::fs::write(&path, content)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Write failed: {}", e)))?;
        Ok(path)
    }

    /// 递归删除文件夹；不存在时返回 NotFound
    pub fn delete_folder(&self, name: &str) -> Result<PathBuf, AgentError> {
        let path = self.resolve(name)?;
        if !path.exists() {
            return Err(AgentError::NotFound(format!(
                "Folder {} does not exist",
                path.display()
            )));
        }
        std::fs::remove_dir_all(&path)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Delete folder failed: {}", e)))?;
        Ok(path)
    }

    /// 删除单个文件；不存在时返回 NotFound
    pub fn delete_file(&self, filename: &str, folder: Option<&str>) -> Result<PathBuf, AgentError> {
        let path = self.resolve_file(filename, folder)?;
        if !path.exists() {
            return Err(AgentError::NotFound(format!(
                "File {} does not exist",
                path.display()
            )));
        }
        std::fs::remove_file(&path)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Delete file failed: {}", e)))?;
        Ok(path)
    }
}
