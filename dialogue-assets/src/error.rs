//! # Error 模块
//!
//! 资源访问错误类型。
//!
//! 解析失败（找不到资源）不是错误，以 `None` 表达；
//! 这里只覆盖真正的 IO 失败。

use thiserror::Error;

/// 资源访问错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// 资源读取失败
    #[error("资源读取失败 '{path}': {message}")]
    LoadFailed {
        /// 逻辑路径
        path: String,
        /// 底层错误信息
        message: String,
    },
}
