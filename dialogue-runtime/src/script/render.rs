//! # Render 模块
//!
//! 将脚本图写回文本语法。
//!
//! 输出不保证与原始文本逐字节一致，但保证**结构等价**：
//! 重新解析渲染结果得到结构相等的脚本（幂等规范化）。

use crate::script::ast::{Node, NodeKind, Script};

/// 将脚本渲染为文本语法
///
/// 节点内字段顺序固定：头部（含条件）、说话者、台词、指令、
/// 选择项、连接、结束标记。节点之间以空行分隔。
pub fn render(script: &Script) -> String {
    let mut out = String::new();

    if !script.filename.is_empty() {
        out.push_str("FN : ");
        out.push_str(&script.filename);
        out.push('\n');
        out.push('\n');
    }

    for (index, node) in script.nodes.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        render_node(node, &mut out);
    }

    out
}

fn render_node(node: &Node, out: &mut String) {
    out.push_str(&node.id);
    if let Some(cond) = node.condition.as_deref()
        && !cond.is_empty()
    {
        out.push_str(" if ");
        out.push_str(cond);
    }
    out.push('\n');

    // 说话者以紧凑形式写回（规范化会在重新解析时复原显示形式）
    if let Some(speaker) = node.speaker.as_deref() {
        out.push_str(&speaker.replace(' ', ""));
        out.push('\n');
    }

    for line in &node.lines {
        out.push_str(line);
        out.push('\n');
    }

    for cmd in &node.commands {
        out.push_str("[[");
        out.push_str(cmd);
        out.push_str("]]\n");
    }

    for choice in &node.choices {
        out.push('[');
        out.push_str(&choice.text);
        out.push('|');
        out.push_str(&choice.target);
        if let Some(cond) = choice.condition.as_deref() {
            out.push('|');
            out.push_str(cond);
        }
        out.push_str("]\n");
    }

    for target in &node.connections {
        out.push('[');
        out.push_str(target);
        out.push_str("]\n");
    }

    if node.kind == NodeKind::End {
        out.push_str("end\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::Parser;

    const SAMPLE: &str = "\
FN : prologue

intro
JohnDoe_happy
Hello there.
What a day.
[[var mood = good]]
[next]

fork
[go left|left] [go right|right]
[secret|vault|found_key == true]

left if mood == good
A sunny path.
[end]

left
A muddy path.
[end]

next
end
";

    #[test]
    fn test_round_trip_is_idempotent() {
        let mut parser = Parser::new();
        let first = parser.parse(SAMPLE);
        let rendered = render(&first);
        let second = parser.parse(&rendered);

        assert_eq!(first, second);
    }

    #[test]
    fn test_render_compacts_speaker() {
        let mut parser = Parser::new();
        let script = parser.parse("intro\nJohnDoe_happy\nHi.\n");

        let rendered = render(&script);
        assert!(rendered.contains("JohnDoe\n"));
        // 重新解析后恢复显示形式
        let reparsed = parser.parse(&rendered);
        assert_eq!(reparsed.nodes[0].speaker.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_render_preserves_filename_and_condition() {
        let mut parser = Parser::new();
        let script = parser.parse("FN : ch1\n\nx if score >= 10\nHigh.\n");

        let rendered = render(&script);
        assert!(rendered.starts_with("FN : ch1\n"));
        assert!(rendered.contains("x if score >= 10\n"));
    }

    #[test]
    fn test_render_end_node() {
        let mut parser = Parser::new();
        let script = parser.parse("finale\nend\n");

        let rendered = render(&script);
        let reparsed = parser.parse(&rendered);
        assert_eq!(reparsed.nodes[0].kind, NodeKind::End);
    }
}
