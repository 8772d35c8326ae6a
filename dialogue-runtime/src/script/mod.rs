//! # Script 模块
//!
//! 脚本的数据模型、解析、渲染与静态校验。
//!
//! ## 模块结构
//!
//! - [`ast`]：脚本图数据模型（Script / Node / Choice）
//! - [`parser`]：文本 → 脚本图
//! - [`render`]：脚本图 → 规范化文本（幂等往返）
//! - [`validate`]：脚本图静态检查

pub mod ast;
pub mod parser;
pub mod render;
pub mod validate;

pub use ast::{Choice, END_TARGET, Node, NodeKind, Script};
pub use parser::Parser;
pub use render::render;
pub use validate::{Diagnostic, DiagnosticLevel, has_errors, validate_script};
