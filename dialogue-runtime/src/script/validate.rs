//! # Validate 模块
//!
//! 脚本图的静态检查，不依赖 IO 或运行时。
//!
//! ## 设计原则
//!
//! - 纯函数 API：`validate_script(&Script) -> Vec<Diagnostic>`，从不失败
//! - 诊断分级：Error（悬空引用、缺失起点）、Warn（可疑但可运行）
//! - 校验失败不阻止脚本加载，由调用方决定如何处置

use std::collections::HashSet;

use crate::script::ast::{Script, END_TARGET};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
///
/// 校验作用在脚本图上，因此用节点标识符而不是行号定位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 相关节点标识符（整体性问题为 None）
    pub node: Option<String>,
    /// 诊断消息
    pub message: String,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            node: None,
            message: message.into(),
        }
    }

    /// 创建警告诊断
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            node: None,
            message: message.into(),
        }
    }

    /// 设置相关节点
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// 是否为错误级别
    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.level)?;
        if let Some(node) = &self.node {
            write!(f, "节点 '{}': ", node)?;
        }
        write!(f, "{}", self.message)
    }
}

/// 诊断列表中是否存在错误级别条目
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// 校验脚本图
///
/// 检查内容：
/// - 起始节点存在且可解析
/// - 所有选项/连接目标是 `end` 或已定义的节点标识符
/// - 同一标识符的多个无条件变体（首个生效，其余不可达）
pub fn validate_script(script: &Script) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // 起始节点
    match &script.start_node {
        None => diagnostics.push(Diagnostic::error("脚本没有起始节点")),
        Some(start) => {
            if !script.contains(start) {
                diagnostics.push(Diagnostic::error(format!(
                    "起始节点 '{}' 未定义",
                    start
                )));
            }
        }
    }

    // 悬空引用
    for node in &script.nodes {
        for choice in &node.choices {
            if !target_resolves(script, &choice.target) {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "选项 '{}' 指向未定义的节点 '{}'",
                        choice.text, choice.target
                    ))
                    .with_node(&node.id),
                );
            }
        }
        for target in &node.connections {
            if !target_resolves(script, target) {
                diagnostics.push(
                    Diagnostic::error(format!("连接指向未定义的节点 '{}'", target))
                        .with_node(&node.id),
                );
            }
        }
    }

    // 重复的无条件变体：首个生效，其余不可达
    let mut reported: HashSet<&str> = HashSet::new();
    for node in &script.nodes {
        if reported.contains(node.id.as_str()) {
            continue;
        }
        let unconditioned = script
            .variants(&node.id)
            .iter()
            .filter(|&&i| !script.nodes[i].is_conditional())
            .count();
        if unconditioned > 1 {
            reported.insert(&node.id);
            diagnostics.push(
                Diagnostic::warn(format!(
                    "存在 {} 个无条件变体，只有最先声明的会被执行",
                    unconditioned
                ))
                .with_node(&node.id),
            );
        }
    }

    diagnostics
}

/// 目标是否可解析（`end` 哨兵或已定义的标识符）
fn target_resolves(script: &Script, target: &str) -> bool {
    target.eq_ignore_ascii_case(END_TARGET) || script.contains(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::Parser;

    fn parse(text: &str) -> Script {
        Parser::new().parse(text)
    }

    #[test]
    fn test_valid_script_has_no_diagnostics() {
        let script = parse("a\nHello.\n[b]\n\nb\n[go|a] [quit|end]\n");
        let diagnostics = validate_script(&script);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_start_node() {
        let script = parse("");
        let diagnostics = validate_script(&script);
        assert!(has_errors(&diagnostics));
        assert!(diagnostics[0].message.contains("起始节点"));
    }

    #[test]
    fn test_dangling_choice_target() {
        let script = parse("a\n[go somewhere|nowhere]\n");
        let diagnostics = validate_script(&script);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert_eq!(diagnostics[0].node.as_deref(), Some("a"));
        assert!(diagnostics[0].message.contains("nowhere"));
    }

    #[test]
    fn test_dangling_connection_target() {
        let script = parse("a\nHello.\n[missing]\n");
        let diagnostics = validate_script(&script);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].to_string().contains("missing"));
    }

    #[test]
    fn test_end_target_is_always_valid() {
        let script = parse("a\nHello.\n[end]\n");
        assert!(validate_script(&script).is_empty());
    }

    #[test]
    fn test_duplicate_unconditioned_variants_warn() {
        let script = parse("a\nFirst.\n\na\nSecond.\n");
        let diagnostics = validate_script(&script);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Warn);
        assert_eq!(diagnostics[0].node.as_deref(), Some("a"));
    }

    #[test]
    fn test_conditioned_variants_do_not_warn() {
        let script = parse("a if score >= 10\nHigh.\n\na\nLow.\n");
        assert!(validate_script(&script).is_empty());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::error("连接指向未定义的节点 'x'").with_node("a");
        let text = d.to_string();
        assert!(text.contains("ERROR"));
        assert!(text.contains("节点 'a'"));
    }
}
