//! # Eval 模块
//!
//! 指令/条件端口及其参考实现。
//!
//! ## 架构
//!
//! 运行时只通过 [`Evaluator`] 这个窄接口调用外部的指令执行与条件求值，
//! 指令和条件在脚本图层面保持为不透明字符串。宿主可以注入自己的实现
//! （驱动视觉、音频等副作用）；[`ScriptEvaluator`] 是内置的参考实现，
//! 维护一个标量变量表并支持 `var <name> = <value>` 赋值指令。

pub mod expr;
mod expr_parser;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use expr::{EvalContext, EvalError, Expr, VarValue, evaluate, evaluate_to_bool};
pub use expr_parser::parse_expression;

/// 指令/条件端口
///
/// 运行时在以下时机调用：
/// - `execute`：进入节点时按顺序执行节点指令（在展示内容之前）
/// - `evaluate`：变体选择和选项过滤
///
/// 两个方法都不允许失败：`execute` 是 fire-and-forget，
/// `evaluate` 对畸形条件返回 `false`。
pub trait Evaluator {
    /// 执行一条指令（副作用，不影响控制流）
    fn execute(&mut self, command: &str);

    /// 求值一个条件
    fn evaluate(&mut self, condition: &str) -> bool;
}

/// 内置的参考求值器
///
/// 维护脚本变量表。指令语法：`var <name> = <value>`，
/// 其他指令被忽略（由宿主层解释）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptEvaluator {
    /// 脚本变量
    variables: HashMap<String, VarValue>,
}

impl ScriptEvaluator {
    /// 创建空的求值器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置变量
    pub fn set_var(&mut self, name: impl Into<String>, value: VarValue) {
        self.variables.insert(name.into(), value);
    }

    /// 获取变量
    pub fn get_var(&self, name: &str) -> Option<&VarValue> {
        self.variables.get(name)
    }

    /// 变量表
    pub fn variables(&self) -> &HashMap<String, VarValue> {
        &self.variables
    }
}

impl EvalContext for ScriptEvaluator {
    fn get_var(&self, name: &str) -> Option<&VarValue> {
        self.variables.get(name)
    }
}

impl Evaluator for ScriptEvaluator {
    fn execute(&mut self, command: &str) {
        let command = command.trim();

        // var <name> = <value>
        if let Some(rest) = command.strip_prefix("var")
            && rest.starts_with(char::is_whitespace)
            && let Some((name, value)) = rest.split_once('=')
        {
            let name = name.trim();
            if is_var_name(name) {
                self.variables
                    .insert(name.to_string(), parse_value(value.trim()));
            }
            return;
        }

        // 其他指令由宿主层解释，这里忽略
    }

    fn evaluate(&mut self, condition: &str) -> bool {
        match parse_expression(condition) {
            Ok(expr) => evaluate_to_bool(&expr, self).unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// 变量名必须是紧凑标识符
fn is_var_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 解析字面量值
///
/// 依次尝试：布尔、整数、浮点数、带引号的字符串，否则原样作为字符串。
fn parse_value(s: &str) -> VarValue {
    match s {
        "true" => return VarValue::Bool(true),
        "false" => return VarValue::Bool(false),
        _ => {}
    }

    if let Ok(n) = s.parse::<i64>() {
        return VarValue::Int(n);
    }
    if let Ok(f) = s.parse::<f64>() {
        return VarValue::Float(f);
    }

    let stripped = s
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')));

    VarValue::String(stripped.unwrap_or(s).to_string())
}
