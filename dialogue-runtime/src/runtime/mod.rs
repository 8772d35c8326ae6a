//! # Runtime 模块
//!
//! 对话执行状态机。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**，不允许隐式全局状态
//! - 执行上下文是运行时的**唯一可变状态**，脚本图只读
//! - 无法推进的操作返回 `false` 并保持状态不变，从不抛出

pub mod engine;

pub use engine::DialogueRuntime;

use serde::{Deserialize, Serialize};

use crate::script::Choice;

/// 对话状态
///
/// # 状态转换
///
/// ```text
/// Stopped          --start()-->   Playing（随即推进一步）
/// Playing          --advance()--> 重新进入推进算法
/// WaitingForInput  --advance()--> 重新进入推进算法
/// WaitingForChoice --choose(i)--> Playing 并推进（目标为 end 时直接 Finished）
/// Playing          --pause()-->   Paused
/// Paused           --resume()-->  Playing
/// 任意状态         --stop()-->    Stopped（丢弃执行上下文）
/// 任意状态         --结束条件-->   Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    /// 未开始或已停止
    Stopped,
    /// 正在推进
    Playing,
    /// 等待调用方确认以展示下一行
    WaitingForInput,
    /// 等待调用方做出选择
    WaitingForChoice,
    /// 已暂停
    Paused,
    /// 已结束
    Finished,
}

impl Default for DialogueState {
    fn default() -> Self {
        Self::Stopped
    }
}

impl DialogueState {
    /// 是否在等待调用方输入
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::WaitingForInput | Self::WaitingForChoice)
    }

    /// 是否处于可推进状态
    pub fn can_advance(&self) -> bool {
        matches!(self, Self::Playing | Self::WaitingForInput)
    }
}

/// 执行上下文
///
/// 一次对话播放的全部可变状态。脚本加载时创建，
/// (重新)开始时重置，停止时丢弃。可序列化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// 当前脚本标识（显示文件名）
    pub script_id: String,
    /// 当前节点标识符
    pub node_id: String,
    /// 当前台词游标（从 0 开始）
    pub line_cursor: usize,
    /// 当前状态
    pub state: DialogueState,
    /// 当前提供的选项列表（仅在 WaitingForChoice 状态非空）
    pub pending_choices: Vec<Choice>,
    /// 本次进入节点已解析到的变体下标
    ///
    /// 指令只在进入节点时执行一次；变体也只在进入时解析一次，
    /// 避免指令副作用在逐行推进中途切换变体。
    pub(crate) resolved_index: Option<usize>,
}

impl ExecutionContext {
    /// 创建新的执行上下文
    pub fn new(script_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            script_id: script_id.into(),
            node_id: node_id.into(),
            line_cursor: 0,
            state: DialogueState::Stopped,
            pending_choices: Vec::new(),
            resolved_index: None,
        }
    }

    /// 导航到目标节点：重置游标和已解析变体
    pub(crate) fn enter_node(&mut self, node_id: String) {
        self.node_id = node_id;
        self.line_cursor = 0;
        self.pending_choices.clear();
        self.resolved_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_helpers() {
        assert!(DialogueState::WaitingForInput.is_waiting());
        assert!(DialogueState::WaitingForChoice.is_waiting());
        assert!(!DialogueState::Playing.is_waiting());

        assert!(DialogueState::Playing.can_advance());
        assert!(DialogueState::WaitingForInput.can_advance());
        assert!(!DialogueState::WaitingForChoice.can_advance());
        assert!(!DialogueState::Finished.can_advance());
    }

    #[test]
    fn test_context_enter_node() {
        let mut ctx = ExecutionContext::new("script", "a");
        ctx.line_cursor = 3;
        ctx.pending_choices.push(Choice::new("x", "y"));
        ctx.resolved_index = Some(1);

        ctx.enter_node("b".to_string());

        assert_eq!(ctx.node_id, "b");
        assert_eq!(ctx.line_cursor, 0);
        assert!(ctx.pending_choices.is_empty());
        assert!(ctx.resolved_index.is_none());
    }

    #[test]
    fn test_context_serialization() {
        let ctx = ExecutionContext::new("script", "intro");
        let json = serde_json::to_string(&ctx).unwrap();
        let loaded: ExecutionContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, loaded);
    }
}
