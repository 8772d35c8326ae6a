//! # Asset Source 模块
//!
//! 资源来源抽象层。
//!
//! ## 设计原则
//!
//! - 所有资源路径在内部使用**逻辑路径**（相对于资源根目录，`/` 分隔符）
//! - 解析器只通过这个窄接口触碰存储，测试可以注入替身并统计调用次数
//! - 目录列举返回**排序后**的条目，保证解析结果确定

use std::path::PathBuf;

use walkdir::WalkDir;

use crate::error::AssetError;

/// 资源来源 trait
///
/// ## 路径约定
///
/// 所有路径参数都是逻辑路径：相对于资源根目录、使用 `/` 分隔符。
pub trait AssetSource {
    /// 读取资源字节
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;

    /// 列出目录下的文件名（含扩展名，非递归，已排序）
    fn list_files(&self, dir: &str) -> Vec<String>;

    /// 列出目录下的子目录名（非递归，已排序）
    fn list_dirs(&self, dir: &str) -> Vec<String>;
}

/// 文件系统资源来源
///
/// 从本地文件系统读取资源。根目录通常是项目的 `assets` 目录。
#[derive(Debug, Clone)]
pub struct FsSource {
    /// 资源根目录
    base_path: PathBuf,
}

impl FsSource {
    /// 创建文件系统资源来源
    ///
    /// # 参数
    /// - `base_path`: 资源根目录（如 `assets`）
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// 解析逻辑路径到完整文件系统路径
    fn resolve(&self, logical_path: &str) -> PathBuf {
        let normalized = logical_path.replace('\\', "/");
        self.base_path.join(normalized)
    }
}

impl AssetSource for FsSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full_path = self.resolve(path);

        std::fs::read(&full_path).map_err(|e| AssetError::LoadFailed {
            path: full_path.to_string_lossy().to_string(),
            message: e.to_string(),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn list_files(&self, dir: &str) -> Vec<String> {
        self.list_entries(dir, true)
    }

    fn list_dirs(&self, dir: &str) -> Vec<String> {
        self.list_entries(dir, false)
    }
}

impl FsSource {
    /// 列出目录直接子项（文件或子目录）
    fn list_entries(&self, dir: &str, files: bool) -> Vec<String> {
        let full_dir = self.resolve(dir);

        let mut entries: Vec<String> = WalkDir::new(&full_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                if files {
                    entry.file_type().is_file()
                } else {
                    entry.file_type().is_dir()
                }
            })
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();

        entries.sort();
        entries
    }
}
