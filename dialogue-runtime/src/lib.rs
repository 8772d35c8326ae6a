//! # Dialogue Runtime
//!
//! 对话脚本引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `dialogue-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 脚本文本被解析为不可变的脚本图，运行时持有可变的执行上下文
//! 在图上行走，并通过回调把台词、选项和状态变化通知给调用方：
//!
//! ```text
//! 脚本文本 → Parser → Script（不可变） → DialogueRuntime → DialogueCallbacks
//!                                            │
//!                                            └─ Evaluator（指令/条件端口）
//! ```
//!
//! ## 核心类型
//!
//! - [`Script`] / [`Node`] / [`Choice`]：脚本图数据模型
//! - [`Parser`]：行式脚本解析器
//! - [`DialogueRuntime`]：执行状态机
//! - [`DialogueCallbacks`]：调用方观察者
//! - [`Evaluator`]：指令/条件端口（[`ScriptEvaluator`] 为参考实现）
//!
//! ## 使用示例
//!
//! ```ignore
//! use dialogue_runtime::{DialogueRuntime, Parser, ScriptEvaluator};
//!
//! let script = Parser::new().parse(&text);
//! let mut runtime = DialogueRuntime::new(script, Box::new(ScriptEvaluator::new()));
//! runtime.set_callbacks(Box::new(scene_callbacks));
//!
//! runtime.start();
//! // 调用方根据回调驱动 advance() / choose()
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：数据模型、解析、渲染、校验
//! - [`runtime`]：执行引擎与状态
//! - [`eval`]：指令/条件端口及参考求值器
//! - [`callbacks`]：观察者接口
//! - [`history`]：有界历史记录
//! - [`error`]：错误类型定义

pub mod callbacks;
pub mod error;
pub mod eval;
pub mod history;
pub mod runtime;
pub mod script;

// 重导出核心类型
pub use callbacks::DialogueCallbacks;
pub use error::ExportError;
pub use eval::{EvalError, Evaluator, ScriptEvaluator, VarValue};
pub use history::{History, HistoryEvent};
pub use runtime::{DialogueRuntime, DialogueState, ExecutionContext};
pub use script::{
    Choice, Diagnostic, DiagnosticLevel, END_TARGET, Node, NodeKind, Parser, Script, render,
    validate_script,
};
