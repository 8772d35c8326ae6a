//! # Parser 模块
//!
//! 行式脚本解析器（手写字符串扫描，无 regex 依赖）。
//!
//! ## 语法概要
//!
//! ```text
//! FN : 显示文件名            （节点外）
//! node_id                   （节点头，可带 `if 条件`）
//! Speaker_happy             （说话者：紧凑标识符，情绪后缀被剥离）
//! 一行台词
//! [[command]]               （内联指令）
//! [选项文本|目标]            （选择项，可带第三段条件）
//! [目标]                     （无条件连接）
//! end                       （终止标记）
//! ```
//!
//! ## 设计原则
//!
//! - 容错解析：节点体内无法识别的行降级为台词，绝不报错
//! - 节点体按优先级分类：指令 → 选择 → 连接 → 结束 → 说话者 → 新节点头 → 台词
//! - 非致命异常记录为警告（带行号）

use crate::script::ast::{Choice, Node, NodeKind, Script, END_TARGET};

/// 脚本解析器
///
/// 持有解析过程中收集的警告，可复用于多个脚本。
pub struct Parser {
    /// 解析警告（非致命问题）
    warnings: Vec<String>,
}

impl Parser {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// 解析脚本文本
    ///
    /// 对畸形输入从不失败；能识别多少就解析多少，
    /// 其余内容降级为台词或记录为警告。
    pub fn parse(&mut self, text: &str) -> Script {
        self.warnings.clear();

        let mut filename = String::new();
        let mut nodes: Vec<Node> = Vec::new();
        // 当前打开的节点 + 是否见到 end 标记
        let mut current: Option<(Node, bool)> = None;

        for (line_idx, raw) in text.lines().enumerate() {
            let line_number = line_idx + 1;
            let line = raw.trim();

            // 注释行在任何位置都被忽略（行首 `#` 没有转义机制）
            if line.starts_with('#') {
                continue;
            }

            if current.is_none() {
                // 节点体外
                if line.is_empty() {
                    continue;
                }
                if let Some(name) = parse_fn_directive(line) {
                    filename = name.to_string();
                    continue;
                }
                if line.eq_ignore_ascii_case(END_TARGET) {
                    self.warnings.push(format!(
                        "第 {} 行：`end` 是保留的终止目标，不能作为节点标识符，已忽略",
                        line_number
                    ));
                    continue;
                }
                if let Some((id, cond)) = parse_node_header(line) {
                    current = Some((open_node(id, cond), false));
                    continue;
                }
                self.warnings.push(format!(
                    "第 {} 行：节点体外无法识别的内容，已忽略: {}",
                    line_number, line
                ));
                continue;
            }

            // 节点体内：空行结束当前节点
            if line.is_empty() {
                close_node(current.take().unwrap(), &mut nodes);
                continue;
            }

            // 先做不需要可变借用的分类判断
            let commands = extract_commands(line);
            let choices = if commands.is_empty() {
                extract_choices(line)
            } else {
                Vec::new()
            };
            let connection = parse_connection(line);
            let is_end = line.eq_ignore_ascii_case(END_TARGET);
            let speaker_eligible = {
                let (node, _) = current.as_ref().unwrap();
                node.speaker.is_none() && node.lines.is_empty() && is_identifier(line)
            };

            let (node, saw_end) = current.as_mut().unwrap();

            if !commands.is_empty() {
                // 1. 指令行：所有 [[...]] 组按从左到右的顺序提取
                node.commands.extend(commands);
            } else if !choices.is_empty() {
                // 2. 选择行：所有 [文本|目标] 对按顺序提取
                node.choices.extend(choices);
            } else if let Some(target) = connection {
                // 3. 普通连接行
                node.connections.push(target.to_string());
            } else if is_end {
                // 4. 结束标记
                *saw_end = true;
            } else if speaker_eligible {
                // 5. 说话者：仅在还没有台词和说话者时生效
                node.speaker = Some(normalize_speaker(line));
            } else if let Some((id, cond)) = parse_node_header(line) {
                // 6. 新节点头，关闭上一个节点
                close_node(current.take().unwrap(), &mut nodes);
                current = Some((open_node(id, cond), false));
            } else {
                // 7. 兜底：原样作为台词
                node.lines.push(line.to_string());
            }
        }

        if let Some(open) = current.take() {
            close_node(open, &mut nodes);
        }

        Script::new(filename, nodes)
    }

    /// 获取解析过程中的警告
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// 打开一个新节点
fn open_node(id: &str, condition: Option<&str>) -> Node {
    let mut node = Node::new(id);
    node.condition = condition.map(String::from);
    node
}

/// 关闭节点：确定类型并入列
///
/// 类型优先级：End 标记 > 有选择项 > 只有指令 > 对话。
fn close_node((mut node, saw_end): (Node, bool), nodes: &mut Vec<Node>) {
    node.kind = if saw_end {
        NodeKind::End
    } else if !node.choices.is_empty() {
        NodeKind::Choice
    } else if node.lines.is_empty() && !node.commands.is_empty() {
        NodeKind::Command
    } else {
        NodeKind::Dialogue
    };
    nodes.push(node);
}

/// 是否为紧凑标识符（`[A-Za-z0-9_]+`）
fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 解析节点头
///
/// 形式：`<id>` 或 `<id> if <条件>`。条件原样保存，不求值。
fn parse_node_header(line: &str) -> Option<(&str, Option<&str>)> {
    if is_identifier(line) {
        return Some((line, None));
    }

    let (head, rest) = line.split_once(char::is_whitespace)?;
    if !is_identifier(head) {
        return None;
    }

    let rest = rest.trim_start();
    let cond = rest.strip_prefix("if")?;
    if !cond.starts_with(char::is_whitespace) {
        return None;
    }
    let cond = cond.trim();
    if cond.is_empty() {
        return None;
    }

    Some((head, Some(cond)))
}

/// 解析 `FN : <name>` 指令
fn parse_fn_directive(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("FN")?;
    let rest = rest.trim_start().strip_prefix(':')?;
    let name = rest.trim();
    if name.is_empty() { None } else { Some(name) }
}

/// 提取一行中的全部 `[[cmd]]` 指令（从左到右）
fn extract_commands(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];
        match after.find("]]") {
            Some(end) => {
                out.push(after[..end].trim().to_string());
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    out
}

/// 提取一行中的全部 `[文本|目标]` / `[文本|目标|条件]` 选择项
fn extract_choices(line: &str) -> Vec<Choice> {
    let mut out = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        match after.find(']') {
            Some(end) => {
                let inner = &after[..end];
                if inner.contains('|') {
                    let mut parts = inner.splitn(3, '|');
                    let text = parts.next().unwrap_or("").trim();
                    let target = parts.next().unwrap_or("").trim();
                    let condition = parts
                        .next()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from);
                    if !target.is_empty() {
                        out.push(Choice {
                            text: text.to_string(),
                            target: target.to_string(),
                            condition,
                        });
                    }
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    out
}

/// 整行形如 `[目标]`（单括号、无竖线）时提取连接目标
fn parse_connection(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty()
        || inner.contains('|')
        || inner.contains('[')
        || inner.contains(']')
    {
        return None;
    }
    let target = inner.trim();
    if target.is_empty() { None } else { Some(target) }
}

/// 规范化说话者显示名
///
/// 剥离第一个 `_` 之后的情绪后缀，然后在小写→大写的字母边界插入空格。
///
/// `JohnDoe_happy` → `John Doe`
fn normalize_speaker(raw: &str) -> String {
    let base = raw.split('_').next().unwrap_or(raw);

    let mut out = String::with_capacity(base.len() + 4);
    let mut prev_lower = false;
    for c in base.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push(' ');
        }
        prev_lower = c.is_ascii_lowercase();
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Script {
        Parser::new().parse(text)
    }

    #[test]
    fn test_parse_basic_nodes() {
        let script = parse(
            "FN : prologue\n\
             \n\
             intro\n\
             Alice\n\
             Hello there.\n\
             What a day.\n\
             [next]\n\
             \n\
             next\n\
             end\n",
        );

        assert_eq!(script.filename, "prologue");
        assert_eq!(script.start_node.as_deref(), Some("intro"));
        assert_eq!(script.len(), 2);

        let intro = &script.nodes[0];
        assert_eq!(intro.kind, NodeKind::Dialogue);
        assert_eq!(intro.speaker.as_deref(), Some("Alice"));
        assert_eq!(intro.lines, vec!["Hello there.", "What a day."]);
        assert_eq!(intro.connections, vec!["next"]);

        assert_eq!(script.nodes[1].kind, NodeKind::End);
    }

    #[test]
    fn test_node_header_with_condition() {
        let script = parse("branch if score >= 10\nConditioned line.\n\nbranch\nFallback line.\n");

        assert_eq!(script.len(), 2);
        assert_eq!(script.nodes[0].condition.as_deref(), Some("score >= 10"));
        assert!(script.nodes[1].condition.is_none());
        // 变体按声明顺序索引
        assert_eq!(script.variants("branch"), &[0, 1]);
        // 起始节点首见生效，不被后来的变体覆盖
        assert_eq!(script.start_node.as_deref(), Some("branch"));
    }

    #[test]
    fn test_header_without_expression_is_not_conditional() {
        // `x if` 缺少表达式，不是节点头，降级为台词
        let script = parse("intro\nAlice\nx if\n");
        assert_eq!(script.len(), 1);
        assert_eq!(script.nodes[0].lines, vec!["x if"]);
    }

    #[test]
    fn test_command_lines() {
        let script = parse("intro\n[[var mood = good]] [[play bell]]\nHello.\n");

        let node = &script.nodes[0];
        assert_eq!(node.commands, vec!["var mood = good", "play bell"]);
        assert_eq!(node.lines, vec!["Hello."]);
        assert_eq!(node.kind, NodeKind::Dialogue);
    }

    #[test]
    fn test_command_only_node_kind() {
        let script = parse("setup\n[[var seen = true]]\n[next]\n\nnext\nHi.\n");
        assert_eq!(script.nodes[0].kind, NodeKind::Command);
        assert_eq!(script.nodes[0].connections, vec!["next"]);
    }

    #[test]
    fn test_choice_lines() {
        let script = parse("fork\n[go left|L] [go right|R]\n[secret|S|found_key == true]\n");

        let node = &script.nodes[0];
        assert_eq!(node.kind, NodeKind::Choice);
        assert_eq!(node.choices.len(), 3);
        assert_eq!(node.choices[0], Choice::new("go left", "L"));
        assert_eq!(node.choices[1], Choice::new("go right", "R"));
        assert_eq!(
            node.choices[2],
            Choice::with_condition("secret", "S", "found_key == true")
        );
    }

    #[test]
    fn test_connection_line() {
        let script = parse("a\nHello.\n[b]\n");
        assert_eq!(script.nodes[0].connections, vec!["b"]);
        // 连接目标不会被当成选择
        assert!(script.nodes[0].choices.is_empty());
    }

    #[test]
    fn test_end_marker_case_insensitive() {
        let script = parse("finale\nEND\n");
        assert_eq!(script.nodes[0].kind, NodeKind::End);
    }

    #[test]
    fn test_speaker_normalization() {
        let script = parse("intro\nJohnDoe_happy\nHi.\n");
        assert_eq!(script.nodes[0].speaker.as_deref(), Some("John Doe"));

        let script = parse("intro\nAlice\nHi.\n");
        assert_eq!(script.nodes[0].speaker.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_speaker_only_before_dialogue() {
        // 已有台词后，紧凑标识符行是新节点头而不是说话者
        let script = parse("a\nSome narration line.\nfollow_up\nMore text.\n");

        assert_eq!(script.len(), 2);
        assert!(script.nodes[0].speaker.is_none());
        assert_eq!(script.nodes[0].lines, vec!["Some narration line."]);
        assert_eq!(script.nodes[1].id, "follow_up");
        assert_eq!(script.nodes[1].lines, vec!["More text."]);
    }

    #[test]
    fn test_narration_first_line_is_not_speaker() {
        // 含空格的行不是紧凑标识符，直接成为台词
        let script = parse("a\nThis is narration without a speaker.\n");
        assert!(script.nodes[0].speaker.is_none());
        assert_eq!(script.nodes[0].lines.len(), 1);
    }

    #[test]
    fn test_unrecognized_body_line_degrades_to_dialogue() {
        let script = parse("a\nAlice\n?!... (sigh)\n");
        assert_eq!(script.nodes[0].lines, vec!["?!... (sigh)"]);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let script = parse(
            "# 文件头注释\n\
             a\n\
             # 节点体内也是注释\n\
             Hello.\n\
             \n\
             # 节点之间\n\
             b\n\
             World.\n",
        );

        assert_eq!(script.len(), 2);
        assert_eq!(script.nodes[0].lines, vec!["Hello."]);
        assert_eq!(script.nodes[1].lines, vec!["World."]);
    }

    #[test]
    fn test_warnings_outside_node() {
        let mut parser = Parser::new();
        let script = parser.parse("this is not a header\n\nintro\nHi.\n");

        assert_eq!(script.len(), 1);
        assert_eq!(parser.warnings().len(), 1);
        assert!(parser.warnings()[0].contains("第 1 行"));
    }

    #[test]
    fn test_end_as_node_id_is_reserved() {
        let mut parser = Parser::new();
        let script = parser.parse("end\n\nintro\nHi.\n");

        assert_eq!(script.len(), 1);
        assert_eq!(script.start_node.as_deref(), Some("intro"));
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn test_fn_directive_between_nodes() {
        let script = parse("a\nHi.\n\nFN : late_name\n\nb\nYo.\n");
        assert_eq!(script.filename, "late_name");
    }

    #[test]
    fn test_unterminated_command_degrades() {
        // 没有闭合的 [[ 不构成指令行，兜底为台词
        let script = parse("a\nAlice\nuse [[this carefully\n");
        assert!(script.nodes[0].commands.is_empty());
        assert_eq!(script.nodes[0].lines, vec!["use [[this carefully"]);
    }

    #[test]
    fn test_header_precedence_inside_body() {
        // 节点体内出现带条件的头部行会开启新节点
        let script = parse("a\nAlice\nHello.\nb if mood == good\nYo.\n");

        assert_eq!(script.len(), 2);
        assert_eq!(script.nodes[1].id, "b");
        assert_eq!(script.nodes[1].condition.as_deref(), Some("mood == good"));
    }
}
