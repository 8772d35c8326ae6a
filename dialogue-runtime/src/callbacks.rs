//! # Callbacks 模块
//!
//! 定义运行时向调用方（场景/UI 层）发出的通知接口。
//!
//! ## 设计说明
//!
//! - 回调是一个显式的、可空的观察者对象，通过 `set_callbacks` 注入，
//!   而不是散落的可赋值字段
//! - 所有方法都有空的默认实现，调用方只需覆盖关心的通知
//! - `on_state_change` 在每次状态写入时触发，包括 `pause`/`resume`
//!   在无意义状态下产生的无变化写入（显式无害，不报错）

use crate::runtime::DialogueState;

/// 运行时观察者
pub trait DialogueCallbacks {
    /// 展示一行台词
    fn on_dialogue_line(&mut self, _text: &str, _speaker: Option<&str>) {}

    /// 当前台词带有说话者（在 `on_dialogue_line` 之前触发）
    fn on_speaker_change(&mut self, _speaker: &str) {}

    /// 出现可选选项（已按条件过滤，顺序与 `choose` 的索引一致）
    fn on_choices_available(&mut self, _choices: &[String]) {}

    /// 对话结束
    fn on_dialogue_finished(&mut self) {}

    /// 状态变化
    fn on_state_change(&mut self, _state: DialogueState) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 默认实现全部为空操作
    struct Silent;

    impl DialogueCallbacks for Silent {}

    #[test]
    fn test_default_methods_are_noops() {
        let mut cb = Silent;
        cb.on_dialogue_line("text", None);
        cb.on_speaker_change("Alice");
        cb.on_choices_available(&["a".to_string()]);
        cb.on_dialogue_finished();
        cb.on_state_change(DialogueState::Stopped);
    }
}
