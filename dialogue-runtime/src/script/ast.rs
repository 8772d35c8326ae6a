//! # AST 模块
//!
//! 定义脚本的结构化表示（脚本图）。
//!
//! ## 设计说明
//!
//! AST 是解析器的输出，运行时只读地遍历它。
//! 同一个标识符可以出现多次（条件变体），声明顺序保留。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// 保留的终止目标标识符
///
/// 选项或连接指向 `end` 时表示对话结束，而不是跳转到某个节点。
pub const END_TARGET: &str = "end";

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// 对话节点（按行展示台词）
    Dialogue,
    /// 选择节点（展示选项列表）
    Choice,
    /// 纯指令节点（只有指令，没有台词）
    Command,
    /// 终止节点
    End,
}

impl Default for NodeKind {
    fn default() -> Self {
        Self::Dialogue
    }
}

/// 选择项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// 选项显示文本
    pub text: String,
    /// 跳转目标节点标识符（或 `end`）
    pub target: String,
    /// 可见条件（None 表示总是可见）
    pub condition: Option<String>,
}

impl Choice {
    /// 创建无条件选择项
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
            condition: None,
        }
    }

    /// 创建带条件的选择项
    pub fn with_condition(
        text: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
            condition: Some(condition.into()),
        }
    }
}

/// 脚本节点
///
/// 对话图中一个可寻址的执行单元。解析完成后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// 节点标识符（变体之间可以重复）
    pub id: String,
    /// 节点类型
    pub kind: NodeKind,
    /// 说话者显示名（已规范化，None 表示旁白）
    pub speaker: Option<String>,
    /// 台词列表（按展示顺序）
    pub lines: Vec<String>,
    /// 内联指令列表（进入节点时按顺序执行）
    pub commands: Vec<String>,
    /// 选择项列表
    pub choices: Vec<Choice>,
    /// 无条件连接目标列表
    pub connections: Vec<String>,
    /// 变体条件（None 表示无条件变体）
    pub condition: Option<String>,
    /// 编辑器画布坐标（仅供外部工具使用，运行时不读取）
    #[serde(default)]
    pub position: Option<(f32, f32)>,
}

impl Node {
    /// 创建空的对话节点
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Dialogue,
            speaker: None,
            lines: Vec::new(),
            commands: Vec::new(),
            choices: Vec::new(),
            connections: Vec::new(),
            condition: None,
            position: None,
        }
    }

    /// 是否为条件变体
    pub fn is_conditional(&self) -> bool {
        self.condition.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// 首个连接目标
    pub fn first_connection(&self) -> Option<&str> {
        self.connections.first().map(String::as_str)
    }
}

/// 解析后的脚本
///
/// 持有节点列表（声明顺序即迭代顺序）和起始节点标识符。
/// `id_index` 将标识符映射到全部变体的下标，便于变体解析。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// 显示文件名（`FN :` 指令设置，可为空）
    pub filename: String,
    /// 起始节点标识符（首个解析到的节点，不被后来者覆盖）
    pub start_node: Option<String>,
    /// 节点列表（含变体，声明顺序）
    pub nodes: Vec<Node>,
    /// 标识符到变体下标的映射
    #[serde(skip)]
    id_index: HashMap<String, Vec<usize>>,
}

impl Script {
    /// 创建新脚本
    ///
    /// 起始节点取首个节点的标识符。
    pub fn new(filename: impl Into<String>, nodes: Vec<Node>) -> Self {
        let start_node = nodes.first().map(|n| n.id.clone());
        let mut script = Self {
            filename: filename.into(),
            start_node,
            nodes,
            id_index: HashMap::new(),
        };
        script.rebuild_index();
        script
    }

    /// 重建标识符索引
    ///
    /// 反序列化之后必须调用（serde 跳过了 `id_index`）。
    pub fn rebuild_index(&mut self) {
        self.id_index.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.id_index.entry(node.id.clone()).or_default().push(index);
        }
    }

    /// 指定标识符的全部变体下标（声明顺序）
    pub fn variants(&self, id: &str) -> &[usize] {
        self.id_index.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 标识符是否存在
    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// 获取指定下标的节点
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// 节点数量（含变体）
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 导出为 JSON 交换格式
    ///
    /// 与文本语法互为无损编码，供外部工具使用。
    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Serialize(e.to_string()))
    }

    /// 从 JSON 交换格式导入
    pub fn from_json(text: &str) -> Result<Self, ExportError> {
        let mut script: Script =
            serde_json::from_str(text).map_err(|e| ExportError::Deserialize(e.to_string()))?;
        script.rebuild_index();
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults() {
        let node = Node::new("intro");
        assert_eq!(node.id, "intro");
        assert_eq!(node.kind, NodeKind::Dialogue);
        assert!(node.speaker.is_none());
        assert!(node.lines.is_empty());
        assert!(!node.is_conditional());
    }

    #[test]
    fn test_node_is_conditional() {
        let mut node = Node::new("x");
        assert!(!node.is_conditional());

        node.condition = Some("score >= 10".to_string());
        assert!(node.is_conditional());

        // 空字符串条件视为无条件
        node.condition = Some(String::new());
        assert!(!node.is_conditional());
    }

    #[test]
    fn test_script_index_with_variants() {
        let mut a1 = Node::new("a");
        a1.condition = Some("score >= 10".to_string());
        let a2 = Node::new("a");
        let b = Node::new("b");

        let script = Script::new("test", vec![a1, a2, b]);

        assert_eq!(script.variants("a"), &[0, 1]);
        assert_eq!(script.variants("b"), &[2]);
        assert!(script.variants("missing").is_empty());
        assert!(script.contains("a"));
        assert!(!script.contains("missing"));
    }

    #[test]
    fn test_script_start_node_is_first() {
        let script = Script::new("test", vec![Node::new("intro"), Node::new("next")]);
        assert_eq!(script.start_node.as_deref(), Some("intro"));

        let empty = Script::new("empty", vec![]);
        assert!(empty.start_node.is_none());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let mut node = Node::new("intro");
        node.speaker = Some("John Doe".to_string());
        node.lines.push("Hello.".to_string());
        node.commands.push("var mood = good".to_string());
        node.choices.push(Choice::new("go left", "left"));
        node.connections.push(END_TARGET.to_string());

        let script = Script::new("prologue", vec![node]);

        let json = script.to_json().unwrap();
        let loaded = Script::from_json(&json).unwrap();

        assert_eq!(script, loaded);
        // 索引在导入后重建
        assert_eq!(loaded.variants("intro"), &[0]);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = Script::from_json("{ not json");
        assert!(result.is_err());
    }
}
