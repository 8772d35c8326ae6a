//! # 表达式解析器
//!
//! 递归下降表达式解析器，支持裸标识符、字面量、比较和逻辑运算。

use crate::eval::expr::{EvalError, Expr};

/// 解析表达式字符串
///
/// 支持的语法:
/// - 字面量: `"string"`, `'string'`, `true`, `false`, `42`, `1.5`
/// - 裸标识符: `score`, `good`（求值时先查变量）
/// - 比较: `==`, `!=`, `<`, `<=`, `>`, `>=`
/// - 逻辑: `expr and expr`, `expr or expr`, `not expr`
/// - 括号: `(expr)`
pub fn parse_expression(input: &str) -> Result<Expr, EvalError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(EvalError::Syntax {
            message: "空表达式".to_string(),
        });
    }

    let mut parser = ExprParser::new(input);
    let expr = parser.parse_or()?;
    parser.skip_whitespace();
    if !parser.remaining().is_empty() {
        return Err(EvalError::Syntax {
            message: format!("表达式末尾存在无法解析的内容: '{}'", parser.remaining()),
        });
    }
    Ok(expr)
}

/// 表达式解析器
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() {
            let c = self.input[self.pos..].chars().next().unwrap();
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        // 关键字都是 ASCII；边界落在多字节字符内时直接不匹配
        if !remaining.is_char_boundary(keyword.len()) {
            return false;
        }
        if !remaining[..keyword.len()].eq_ignore_ascii_case(keyword) {
            return false;
        }
        // 确保后面是空白、括号或结束
        let after = &remaining[keyword.len()..];
        after.is_empty()
            || after.starts_with(char::is_whitespace)
            || after.starts_with('(')
            || after.starts_with(')')
    }

    fn consume_keyword(&mut self, keyword: &str) {
        self.pos += keyword.len();
        self.skip_whitespace();
    }

    /// 解析 or 表达式（最低优先级）
    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_and()?;

        loop {
            self.skip_whitespace();
            if self.starts_with_keyword("or") {
                self.consume_keyword("or");
                let right = self.parse_and()?;
                left = Expr::or(left, right);
            } else {
                break;
            }
        }

        Ok(left)
    }

    /// 解析 and 表达式
    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_not()?;

        loop {
            self.skip_whitespace();
            if self.starts_with_keyword("and") {
                self.consume_keyword("and");
                let right = self.parse_not()?;
                left = Expr::and(left, right);
            } else {
                break;
            }
        }

        Ok(left)
    }

    /// 解析 not 表达式
    fn parse_not(&mut self) -> Result<Expr, EvalError> {
        self.skip_whitespace();
        if self.starts_with_keyword("not") {
            self.consume_keyword("not");
            let expr = self.parse_not()?;
            Ok(Expr::not(expr))
        } else {
            self.parse_comparison()
        }
    }

    /// 解析比较表达式
    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let left = self.parse_primary()?;

        self.skip_whitespace();

        // 双字符运算符优先
        let ops: [(&str, fn(Expr, Expr) -> Expr); 6] = [
            ("==", Expr::eq),
            ("!=", Expr::not_eq),
            (">=", Expr::ge),
            ("<=", Expr::le),
            (">", Expr::gt),
            ("<", Expr::lt),
        ];

        for (op, build) in ops {
            if self.remaining().starts_with(op) {
                self.pos += op.len();
                self.skip_whitespace();
                let right = self.parse_primary()?;
                return Ok(build(left, right));
            }
        }

        Ok(left)
    }

    /// 解析基本表达式
    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        self.skip_whitespace();

        let c = self.peek_char().ok_or_else(|| EvalError::Syntax {
            message: "表达式意外结束".to_string(),
        })?;

        match c {
            // 括号
            '(' => {
                self.consume_char();
                let expr = self.parse_or()?;
                self.skip_whitespace();
                if self.peek_char() != Some(')') {
                    return Err(EvalError::Syntax {
                        message: "缺少右括号 ')'".to_string(),
                    });
                }
                self.consume_char();
                Ok(expr)
            }

            // 字符串字面量
            '"' => {
                let s = self.parse_string_literal('"')?;
                Ok(Expr::string(s))
            }
            '\'' => {
                let s = self.parse_string_literal('\'')?;
                Ok(Expr::string(s))
            }

            // 数字、布尔或裸标识符
            _ => {
                if self.starts_with_keyword("true") {
                    self.consume_keyword("true");
                    Ok(Expr::bool(true))
                } else if self.starts_with_keyword("false") {
                    self.consume_keyword("false");
                    Ok(Expr::bool(false))
                } else if c.is_ascii_digit() || c == '-' {
                    self.parse_number()
                } else {
                    let name = self.parse_identifier()?;
                    Ok(Expr::ident(name))
                }
            }
        }
    }

    /// 解析标识符
    fn parse_identifier(&mut self) -> Result<String, EvalError> {
        let start = self.pos;

        while self.pos < self.input.len() {
            let c = self.input[self.pos..].chars().next().unwrap();
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(EvalError::Syntax {
                message: format!(
                    "无法解析表达式，意外字符: '{}'",
                    self.peek_char().unwrap_or(' ')
                ),
            });
        }

        Ok(self.input[start..self.pos].to_string())
    }

    /// 解析字符串字面量
    fn parse_string_literal(&mut self, quote: char) -> Result<String, EvalError> {
        self.consume_char(); // 消费开始引号
        let start = self.pos;

        while self.pos < self.input.len() {
            let c = self.input[self.pos..].chars().next().unwrap();
            if c == quote {
                let s = self.input[start..self.pos].to_string();
                self.consume_char(); // 消费结束引号
                return Ok(s);
            }
            self.pos += c.len_utf8();
        }

        Err(EvalError::Syntax {
            message: format!("字符串字面量未闭合，缺少 '{}'", quote),
        })
    }

    /// 解析数字（整数或浮点数）
    fn parse_number(&mut self) -> Result<Expr, EvalError> {
        let start = self.pos;

        // 处理负号
        if self.peek_char() == Some('-') {
            self.consume_char();
        }

        let mut saw_dot = false;
        while self.pos < self.input.len() {
            let c = self.input[self.pos..].chars().next().unwrap();
            if c.is_ascii_digit() {
                self.pos += c.len_utf8();
            } else if c == '.' && !saw_dot {
                saw_dot = true;
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        let num_str = &self.input[start..self.pos];
        if saw_dot {
            num_str
                .parse::<f64>()
                .map(Expr::float)
                .map_err(|_| EvalError::Syntax {
                    message: format!("无法解析数字: '{}'", num_str),
                })
        } else {
            num_str
                .parse::<i64>()
                .map(Expr::int)
                .map_err(|_| EvalError::Syntax {
                    message: format!("无法解析数字: '{}'", num_str),
                })
        }
    }
}
