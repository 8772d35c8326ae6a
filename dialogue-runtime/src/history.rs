//! # History 模块
//!
//! 历史记录数据模型，用于支持历史回看功能。
//!
//! ## 设计原则
//!
//! - 记录已展示的台词和已做出的选择
//! - 有界 FIFO：超出容量时最旧的条目先被淘汰
//! - 所有数据可序列化

use serde::{Deserialize, Serialize};

/// 默认最大记录数
pub const DEFAULT_MAX_EVENTS: usize = 100;

/// 历史事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// 台词事件
    Dialogue {
        /// 说话者（None 表示旁白）
        speaker: Option<String>,
        /// 台词内容
        content: String,
        /// 时间戳（Unix 秒）
        timestamp: u64,
    },

    /// 选择事件
    Choice {
        /// 被选中的选项文本
        text: String,
        /// 选项目标
        target: String,
        /// 时间戳
        timestamp: u64,
    },
}

impl HistoryEvent {
    /// 获取事件时间戳
    pub fn timestamp(&self) -> u64 {
        match self {
            HistoryEvent::Dialogue { timestamp, .. } => *timestamp,
            HistoryEvent::Choice { timestamp, .. } => *timestamp,
        }
    }

    /// 创建台词事件
    pub fn dialogue(speaker: Option<String>, content: String) -> Self {
        HistoryEvent::Dialogue {
            speaker,
            content,
            timestamp: current_timestamp(),
        }
    }

    /// 创建选择事件
    pub fn choice(text: String, target: String) -> Self {
        HistoryEvent::Choice {
            text,
            target,
            timestamp: current_timestamp(),
        }
    }
}

/// 历史记录容器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    /// 事件列表（按时间顺序）
    events: Vec<HistoryEvent>,
    /// 最大记录数（防止内存无限增长）
    max_events: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// 创建新的历史记录
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            max_events: DEFAULT_MAX_EVENTS,
        }
    }

    /// 设置最大记录数
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// 添加事件
    pub fn push(&mut self, event: HistoryEvent) {
        self.events.push(event);

        // 如果超过最大数量，移除最早的事件
        while self.events.len() > self.max_events {
            self.events.remove(0);
        }
    }

    /// 获取所有事件
    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    /// 获取台词事件数量
    pub fn dialogue_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HistoryEvent::Dialogue { .. }))
            .count()
    }

    /// 获取选择事件数量
    pub fn choice_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HistoryEvent::Choice { .. }))
            .count()
    }

    /// 清空历史
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// 获取事件总数
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// 获取当前时间戳（Unix 秒）
fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
