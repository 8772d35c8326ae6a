//! # Error 模块
//!
//! 定义 dialogue-runtime 中使用的错误类型。
//!
//! 解析和运行时操作对畸形输入从不报错（降级或返回 false），
//! 这里只覆盖 JSON 交换边界等真正的硬错误。

use thiserror::Error;

/// JSON 交换格式错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// 序列化失败
    #[error("JSON 导出失败: {0}")]
    Serialize(String),

    /// 反序列化失败
    #[error("JSON 导入失败: {0}")]
    Deserialize(String),
}
