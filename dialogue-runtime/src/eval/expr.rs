//! # 表达式模块
//!
//! 定义条件表达式的 AST 和求值器。
//!
//! ## 设计原则
//!
//! - 表达式是**无副作用**的纯函数
//! - 求值是**确定性**的，不依赖 IO 或真实时间
//! - 裸标识符先查变量，查不到时退化为字符串字面量
//!
//! ## 支持的操作
//!
//! - 比较: `==`, `!=`, `<`, `<=`, `>`, `>=`（排序比较仅限数值）
//! - 逻辑: `and`, `or`, `not`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 脚本变量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 布尔值
    Bool(bool),
}

/// 表达式 AST 节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// 字面量值
    Literal(VarValue),

    /// 裸标识符
    ///
    /// 求值时先查变量，未定义则视为字符串字面量
    Ident(String),

    /// 相等比较
    Eq(Box<Expr>, Box<Expr>),

    /// 不等比较
    NotEq(Box<Expr>, Box<Expr>),

    /// 小于
    Lt(Box<Expr>, Box<Expr>),

    /// 小于等于
    Le(Box<Expr>, Box<Expr>),

    /// 大于
    Gt(Box<Expr>, Box<Expr>),

    /// 大于等于
    Ge(Box<Expr>, Box<Expr>),

    /// 逻辑与
    And(Box<Expr>, Box<Expr>),

    /// 逻辑或
    Or(Box<Expr>, Box<Expr>),

    /// 逻辑非
    Not(Box<Expr>),
}

impl Expr {
    /// 创建字符串字面量
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(VarValue::String(s.into()))
    }

    /// 创建布尔字面量
    pub fn bool(b: bool) -> Self {
        Self::Literal(VarValue::Bool(b))
    }

    /// 创建整数字面量
    pub fn int(n: i64) -> Self {
        Self::Literal(VarValue::Int(n))
    }

    /// 创建浮点字面量
    pub fn float(f: f64) -> Self {
        Self::Literal(VarValue::Float(f))
    }

    /// 创建裸标识符
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// 创建相等比较
    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::Eq(Box::new(left), Box::new(right))
    }

    /// 创建不等比较
    pub fn not_eq(left: Expr, right: Expr) -> Self {
        Self::NotEq(Box::new(left), Box::new(right))
    }

    /// 创建小于比较
    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::Lt(Box::new(left), Box::new(right))
    }

    /// 创建小于等于比较
    pub fn le(left: Expr, right: Expr) -> Self {
        Self::Le(Box::new(left), Box::new(right))
    }

    /// 创建大于比较
    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::Gt(Box::new(left), Box::new(right))
    }

    /// 创建大于等于比较
    pub fn ge(left: Expr, right: Expr) -> Self {
        Self::Ge(Box::new(left), Box::new(right))
    }

    /// 创建逻辑与
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// 创建逻辑或
    pub fn or(left: Expr, right: Expr) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// 创建逻辑非
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Self::Not(Box::new(expr))
    }
}

/// 表达式错误（解析或求值）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// 语法错误
    #[error("表达式语法错误: {message}")]
    Syntax { message: String },

    /// 类型不匹配
    #[error("类型不匹配: 期望 {expected}，实际 {actual} ({context})")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
        context: String,
    },
}

/// 表达式求值上下文
///
/// 提供变量查找能力
pub trait EvalContext {
    /// 获取变量值
    fn get_var(&self, name: &str) -> Option<&VarValue>;
}

/// 对表达式求值
pub fn evaluate(expr: &Expr, ctx: &impl EvalContext) -> Result<VarValue, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        // 裸标识符：已定义的变量取值，否则作为字符串字面量
        Expr::Ident(name) => Ok(ctx
            .get_var(name)
            .cloned()
            .unwrap_or_else(|| VarValue::String(name.clone()))),

        Expr::Eq(left, right) => {
            let left_val = evaluate(left, ctx)?;
            let right_val = evaluate(right, ctx)?;
            Ok(VarValue::Bool(values_equal(&left_val, &right_val)))
        }

        Expr::NotEq(left, right) => {
            let left_val = evaluate(left, ctx)?;
            let right_val = evaluate(right, ctx)?;
            Ok(VarValue::Bool(!values_equal(&left_val, &right_val)))
        }

        Expr::Lt(left, right) => compare_ordering(left, right, ctx, "<", |o| o.is_lt()),
        Expr::Le(left, right) => compare_ordering(left, right, ctx, "<=", |o| o.is_le()),
        Expr::Gt(left, right) => compare_ordering(left, right, ctx, ">", |o| o.is_gt()),
        Expr::Ge(left, right) => compare_ordering(left, right, ctx, ">=", |o| o.is_ge()),

        Expr::And(left, right) => {
            let left_val = evaluate(left, ctx)?;
            let left_bool = to_bool(&left_val, "and 左操作数")?;

            // 短路求值
            if !left_bool {
                return Ok(VarValue::Bool(false));
            }

            let right_val = evaluate(right, ctx)?;
            let right_bool = to_bool(&right_val, "and 右操作数")?;
            Ok(VarValue::Bool(right_bool))
        }

        Expr::Or(left, right) => {
            let left_val = evaluate(left, ctx)?;
            let left_bool = to_bool(&left_val, "or 左操作数")?;

            // 短路求值
            if left_bool {
                return Ok(VarValue::Bool(true));
            }

            let right_val = evaluate(right, ctx)?;
            let right_bool = to_bool(&right_val, "or 右操作数")?;
            Ok(VarValue::Bool(right_bool))
        }

        Expr::Not(inner) => {
            let inner_val = evaluate(inner, ctx)?;
            let inner_bool = to_bool(&inner_val, "not 操作数")?;
            Ok(VarValue::Bool(!inner_bool))
        }
    }
}

/// 排序比较（仅数值）
fn compare_ordering(
    left: &Expr,
    right: &Expr,
    ctx: &impl EvalContext,
    op: &'static str,
    test: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<VarValue, EvalError> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    let (a, b) = match (as_number(&left_val), as_number(&right_val)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(EvalError::TypeMismatch {
                expected: "数值",
                actual: format!("{:?} {} {:?}", left_val, op, right_val),
                context: "排序比较".to_string(),
            });
        }
    };

    match a.partial_cmp(&b) {
        Some(ordering) => Ok(VarValue::Bool(test(ordering))),
        // NaN 参与的比较恒为 false
        None => Ok(VarValue::Bool(false)),
    }
}

/// 数值视图（Int/Float 统一到 f64）
fn as_number(value: &VarValue) -> Option<f64> {
    match value {
        VarValue::Int(n) => Some(*n as f64),
        VarValue::Float(f) => Some(*f),
        _ => None,
    }
}

/// 判断两个值是否相等
///
/// Int 与 Float 按数值比较，其余跨类型永远不相等
fn values_equal(left: &VarValue, right: &VarValue) -> bool {
    match (left, right) {
        (VarValue::String(a), VarValue::String(b)) => a == b,
        (VarValue::Bool(a), VarValue::Bool(b)) => a == b,
        (VarValue::Int(a), VarValue::Int(b)) => a == b,
        (VarValue::Float(a), VarValue::Float(b)) => (a - b).abs() < f64::EPSILON,
        (VarValue::Int(a), VarValue::Float(b)) | (VarValue::Float(b), VarValue::Int(a)) => {
            (*a as f64 - b).abs() < f64::EPSILON
        }
        _ => false,
    }
}

/// 将值转换为布尔值
fn to_bool(value: &VarValue, context: &str) -> Result<bool, EvalError> {
    match value {
        VarValue::Bool(b) => Ok(*b),
        other => Err(EvalError::TypeMismatch {
            expected: "Bool",
            actual: format!("{:?}", other),
            context: context.to_string(),
        }),
    }
}

/// 将表达式求值为布尔值
///
/// 便捷函数，用于条件分支
pub fn evaluate_to_bool(expr: &Expr, ctx: &impl EvalContext) -> Result<bool, EvalError> {
    let value = evaluate(expr, ctx)?;
    to_bool(&value, "条件表达式")
}
