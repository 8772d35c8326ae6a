//! # Engine 模块
//!
//! 对话运行时核心执行引擎。
//!
//! ## 推进算法（单步）
//!
//! 1. 解析当前节点的匹配变体（条件变体优先，声明顺序）；解析失败则结束
//! 2. 通过指令端口按顺序执行节点的全部指令（严格先于内容展示）
//! 3. End 变体 → 结束
//! 4. Choice 变体 → 按条件过滤选项；全部不可见则结束，否则进入 WaitingForChoice
//! 5. Dialogue/Command 变体 → 游标未耗尽时发出当前台词并进入 WaitingForInput
//!    （启用自动推进时保持 Playing）；耗尽后跟随第一个连接，`end` 或无连接则结束

use crate::callbacks::DialogueCallbacks;
use crate::eval::Evaluator;
use crate::history::{History, HistoryEvent};
use crate::runtime::{DialogueState, ExecutionContext};
use crate::script::{Choice, NodeKind, Script, END_TARGET};

/// 默认自动推进延迟提示（秒）
pub const DEFAULT_AUTO_ADVANCE_DELAY_SECS: f32 = 2.0;

/// 对话运行时
///
/// 驱动脚本图的执行，通过回调把台词/选项/状态变化通知给调用方。
/// 脚本图在执行期间只读；运行时只变更自己的执行上下文。
///
/// # 使用示例
///
/// ```ignore
/// let script = Parser::new().parse(text);
/// let mut runtime = DialogueRuntime::new(script, Box::new(ScriptEvaluator::new()));
/// runtime.set_callbacks(Box::new(MySceneCallbacks::new()));
///
/// runtime.start();
/// // 调用方在回调中收到台词，之后：
/// runtime.advance();          // 下一行
/// runtime.choose(0);          // 在 WaitingForChoice 状态选择
/// ```
pub struct DialogueRuntime {
    /// 当前脚本（只读）
    script: Script,
    /// 指令/条件端口
    evaluator: Box<dyn Evaluator>,
    /// 观察者（可空）
    callbacks: Option<Box<dyn DialogueCallbacks>>,
    /// 执行上下文（stop 后为 None）
    context: Option<ExecutionContext>,
    /// 历史记录
    history: History,
    /// 自动推进开关（节奏由调用方驱动）
    auto_advance: bool,
    /// 自动推进延迟提示（秒），运行时自身不计时
    auto_advance_delay_secs: f32,
}

impl DialogueRuntime {
    /// 创建新的运行时实例
    ///
    /// 依赖通过构造显式注入：脚本图和指令/条件端口。
    pub fn new(script: Script, evaluator: Box<dyn Evaluator>) -> Self {
        let context = Some(ExecutionContext::new(
            &script.filename,
            script.start_node.clone().unwrap_or_default(),
        ));
        Self {
            script,
            evaluator,
            callbacks: None,
            context,
            history: History::new(),
            auto_advance: false,
            auto_advance_delay_secs: DEFAULT_AUTO_ADVANCE_DELAY_SECS,
        }
    }

    /// 替换整个脚本图
    ///
    /// 执行上下文重新创建（Stopped）；历史记录保留，由调用方决定是否清空。
    pub fn load_script(&mut self, script: Script) {
        self.context = Some(ExecutionContext::new(
            &script.filename,
            script.start_node.clone().unwrap_or_default(),
        ));
        self.script = script;
    }

    /// 注入观察者
    pub fn set_callbacks(&mut self, callbacks: Box<dyn DialogueCallbacks>) {
        self.callbacks = Some(callbacks);
    }

    /// 移除观察者
    pub fn clear_callbacks(&mut self) {
        self.callbacks = None;
    }

    /// (重新)开始播放
    ///
    /// 重置执行上下文到起始节点并立即推进一步。
    /// 起始节点缺失或未定义时失败（返回 `false`，状态不变）。
    pub fn start(&mut self) -> bool {
        let Some(start) = self.script.start_node.clone() else {
            return false;
        };
        if !self.script.contains(&start) {
            return false;
        }

        self.context = Some(ExecutionContext::new(&self.script.filename, start));
        self.set_state(DialogueState::Playing);
        self.step();
        true
    }

    /// 推进一步
    ///
    /// 仅在 `Playing` / `WaitingForInput` 状态有效，其他状态返回 `false`。
    pub fn advance(&mut self) -> bool {
        if !self.state().can_advance() {
            return false;
        }
        self.set_state(DialogueState::Playing);
        self.step();
        true
    }

    /// 选择当前提供的第 `index` 个选项
    ///
    /// 仅在 `WaitingForChoice` 状态有效；越界或状态不符时静默失败
    /// （返回 `false`，执行上下文不变）。
    pub fn choose(&mut self, index: usize) -> bool {
        if self.state() != DialogueState::WaitingForChoice {
            return false;
        }

        let choice = {
            let ctx = self.context.as_ref().unwrap();
            match ctx.pending_choices.get(index) {
                Some(choice) => choice.clone(),
                None => return false,
            }
        };

        self.history
            .push(HistoryEvent::choice(choice.text.clone(), choice.target.clone()));

        if choice.target.eq_ignore_ascii_case(END_TARGET) {
            self.finish();
            return true;
        }

        if let Some(ctx) = self.context.as_mut() {
            ctx.enter_node(choice.target);
        }
        self.set_state(DialogueState::Playing);
        self.step();
        true
    }

    /// 暂停
    ///
    /// 仅 `Playing` → `Paused`；其他状态下显式无害：
    /// 状态不变，仅重放一次状态通知。
    pub fn pause(&mut self) -> bool {
        if self.state() == DialogueState::Playing {
            self.set_state(DialogueState::Paused);
            true
        } else {
            let current = self.state();
            self.set_state(current);
            false
        }
    }

    /// 恢复
    ///
    /// 仅 `Paused` → `Playing`；其他状态下显式无害。
    pub fn resume(&mut self) -> bool {
        if self.state() == DialogueState::Paused {
            self.set_state(DialogueState::Playing);
            true
        } else {
            let current = self.state();
            self.set_state(current);
            false
        }
    }

    /// 停止
    ///
    /// 任何状态下都安全且幂等；执行上下文被丢弃。
    pub fn stop(&mut self) {
        self.context = None;
        self.notify(|cb| cb.on_state_change(DialogueState::Stopped));
    }

    /// 当前状态
    pub fn state(&self) -> DialogueState {
        self.context
            .as_ref()
            .map(|ctx| ctx.state)
            .unwrap_or(DialogueState::Stopped)
    }

    /// 当前执行上下文
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }

    /// 当前脚本
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// 历史记录
    pub fn history(&self) -> &History {
        &self.history
    }

    /// 清空历史记录
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// 设置自动推进开关
    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
    }

    /// 自动推进是否开启
    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    /// 设置自动推进延迟提示（秒）
    pub fn set_auto_advance_delay_secs(&mut self, secs: f32) {
        self.auto_advance_delay_secs = secs;
    }

    /// 自动推进延迟提示（秒）
    pub fn auto_advance_delay_secs(&self) -> f32 {
        self.auto_advance_delay_secs
    }

    // ------------------------------------------------------------------
    // 内部实现
    // ------------------------------------------------------------------

    /// 推进算法主循环
    fn step(&mut self) {
        loop {
            if self.context.is_none() {
                return;
            }

            // 1. 解析当前节点变体（每次进入节点只解析一次）
            let resolved = match self.context.as_ref().unwrap().resolved_index {
                Some(index) => index,
                None => {
                    let node_id = self.context.as_ref().unwrap().node_id.clone();
                    let Some(index) = self.resolve_variant(&node_id) else {
                        self.finish();
                        return;
                    };
                    self.context.as_mut().unwrap().resolved_index = Some(index);

                    // 2. 进入节点时按顺序执行全部指令（严格先于内容展示）
                    let commands = self.script.nodes[index].commands.clone();
                    for command in &commands {
                        self.evaluator.execute(command);
                    }
                    index
                }
            };

            let node = self.script.nodes[resolved].clone();

            match node.kind {
                // 3. 终止节点
                NodeKind::End => {
                    self.finish();
                    return;
                }

                // 4. 选择节点：按条件过滤选项
                NodeKind::Choice => {
                    let visible: Vec<Choice> = node
                        .choices
                        .iter()
                        .filter(|choice| self.choice_visible(choice))
                        .cloned()
                        .collect();

                    if visible.is_empty() {
                        self.finish();
                        return;
                    }

                    let texts: Vec<String> =
                        visible.iter().map(|choice| choice.text.clone()).collect();
                    self.context.as_mut().unwrap().pending_choices = visible;
                    self.set_state(DialogueState::WaitingForChoice);
                    self.notify(|cb| cb.on_choices_available(&texts));
                    return;
                }

                // 5. 对话/指令节点：逐行展示，然后跟随连接
                NodeKind::Dialogue | NodeKind::Command => {
                    let cursor = self.context.as_ref().unwrap().line_cursor;

                    if cursor < node.lines.len() {
                        let text = node.lines[cursor].clone();
                        self.context.as_mut().unwrap().line_cursor += 1;

                        if let Some(speaker) = node.speaker.as_deref() {
                            self.notify(|cb| cb.on_speaker_change(speaker));
                        }
                        self.notify(|cb| cb.on_dialogue_line(&text, node.speaker.as_deref()));
                        self.history
                            .push(HistoryEvent::dialogue(node.speaker.clone(), text));

                        // 自动推进时保持 Playing，节奏由调用方驱动
                        if !self.auto_advance {
                            self.set_state(DialogueState::WaitingForInput);
                        }
                        return;
                    }

                    // 台词耗尽：跟随第一个连接
                    match node.first_connection() {
                        None => {
                            self.finish();
                            return;
                        }
                        Some(target) if target.eq_ignore_ascii_case(END_TARGET) => {
                            self.finish();
                            return;
                        }
                        Some(target) => {
                            // 导航：重置游标并继续推进，至少再解析一步内容
                            let target = target.to_string();
                            self.context.as_mut().unwrap().enter_node(target);
                            self.set_state(DialogueState::Playing);
                        }
                    }
                }
            }
        }
    }

    /// 解析标识符的匹配变体
    ///
    /// 带非空条件的变体总是优先于无条件变体，按声明顺序求值，
    /// 第一个条件为真的（或第一个无条件的）变体被选中。
    fn resolve_variant(&mut self, id: &str) -> Option<usize> {
        let indices = self.script.variants(id).to_vec();

        for &index in &indices {
            if self.script.nodes[index].is_conditional() {
                let condition = self.script.nodes[index].condition.clone().unwrap();
                if self.evaluator.evaluate(&condition) {
                    return Some(index);
                }
            }
        }

        indices
            .into_iter()
            .find(|&index| !self.script.nodes[index].is_conditional())
    }

    /// 选项是否可见
    fn choice_visible(&mut self, choice: &Choice) -> bool {
        match choice.condition.as_deref() {
            None => true,
            Some(cond) if cond.is_empty() => true,
            Some(cond) => self.evaluator.evaluate(cond),
        }
    }

    /// 进入结束状态
    fn finish(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.pending_choices.clear();
        }
        self.set_state(DialogueState::Finished);
        self.notify(|cb| cb.on_dialogue_finished());
    }

    /// 写入状态并通知观察者
    ///
    /// 每次写入都触发 `on_state_change`，包括值未变化的写入。
    fn set_state(&mut self, state: DialogueState) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.state = state;
        }
        self.notify(|cb| cb.on_state_change(state));
    }

    /// 向观察者发送通知（未注入观察者时为空操作）
    fn notify(&mut self, f: impl FnOnce(&mut dyn DialogueCallbacks)) {
        if let Some(callbacks) = self.callbacks.as_mut() {
            f(callbacks.as_mut());
        }
    }
}
