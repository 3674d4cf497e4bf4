//! 词法分析
//!
//! 将规则文本切分为记号序列。属性路径（含点号和方括号下标）作为单个记号，
//! 引号内的括号与另一种引号都是普通字符，不影响括号配对。

use crate::error::{LexErrorKind, Result, RuleError};
use crate::operators::{ArithmeticOperator, LogicalOperator, RelationalOperator, SpecialVerb};
use crate::path::{is_ident_char, is_ident_start};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Path(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Rel(RelationalOperator),
    Logic(LogicalOperator),
    Arith(ArithmeticOperator),
    Verb(SpecialVerb),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

impl TokenKind {
    /// 是否可以结束一个操作数（决定 `-` 是符号还是减号）
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::Path(_)
                | Self::Str(_)
                | Self::Int(_)
                | Self::Float(_)
                | Self::Bool(_)
                | Self::RParen
                | Self::RBracket
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "'{}'", p),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Rel(op) => write!(f, "'{}'", op),
            Self::Logic(op) => write!(f, "'{}'", op.symbol()),
            Self::Arith(op) => write!(f, "'{}'", op),
            Self::Verb(verb) => write!(f, "'{}'", verb),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::Comma => write!(f, "','"),
            Self::Eof => write!(f, "<EOF>"),
        }
    }
}

/// 记号及其在规则文本中的字节偏移
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub struct Lexer<'s> {
    source: &'s str,
    chars: Vec<(usize, char)>,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// 生成记号序列，末尾总是 `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.peek(0) {
            let offset = self.offset();
            match c {
                c if c.is_whitespace() => self.pos += 1,
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                ',' => self.single(TokenKind::Comma),
                '+' => self.single(TokenKind::Arith(ArithmeticOperator::Add)),
                '*' => self.single(TokenKind::Arith(ArithmeticOperator::Mul)),
                '/' => self.single(TokenKind::Arith(ArithmeticOperator::Div)),
                '%' => self.single(TokenKind::Arith(ArithmeticOperator::Rem)),
                '=' if self.peek(1) == Some('=') => {
                    self.double(TokenKind::Rel(RelationalOperator::Eq))
                }
                '!' if self.peek(1) == Some('=') => {
                    self.double(TokenKind::Rel(RelationalOperator::Ne))
                }
                '<' if self.peek(1) == Some('=') => {
                    self.double(TokenKind::Rel(RelationalOperator::Le))
                }
                '>' if self.peek(1) == Some('=') => {
                    self.double(TokenKind::Rel(RelationalOperator::Ge))
                }
                '<' => self.single(TokenKind::Rel(RelationalOperator::Lt)),
                '>' => self.single(TokenKind::Rel(RelationalOperator::Gt)),
                '&' if self.peek(1) == Some('&') => {
                    self.double(TokenKind::Logic(LogicalOperator::And))
                }
                '|' if self.peek(1) == Some('|') => {
                    self.double(TokenKind::Logic(LogicalOperator::Or))
                }
                '-' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) && !self.after_operand() => {
                    self.number()?
                }
                '-' => self.single(TokenKind::Arith(ArithmeticOperator::Sub)),
                '\'' | '"' => {
                    let s = self.string_literal()?;
                    self.push(TokenKind::Str(s), offset);
                }
                c if c.is_ascii_digit() => self.number()?,
                c if is_ident_start(c) => self.word()?,
                other => {
                    return Err(RuleError::Lex {
                        kind: LexErrorKind::UnexpectedChar(other),
                        offset,
                    });
                }
            }
        }

        let end = self.source.len();
        self.push(TokenKind::Eof, end);
        Ok(self.tokens)
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len())
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        self.tokens.push(Token { kind, offset });
    }

    fn single(&mut self, kind: TokenKind) {
        let offset = self.offset();
        self.pos += 1;
        self.push(kind, offset);
    }

    fn double(&mut self, kind: TokenKind) {
        let offset = self.offset();
        self.pos += 2;
        self.push(kind, offset);
    }

    fn after_operand(&self) -> bool {
        self.tokens.last().is_some_and(|t| t.kind.ends_operand())
    }

    /// 读取引号字符串，支持 `\'`、`\"`、`\\` 转义
    fn string_literal(&mut self) -> Result<String> {
        let start = self.offset();
        let quote = self.peek(0).unwrap_or('\'');
        self.pos += 1;

        let mut value = String::new();
        loop {
            match self.peek(0) {
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') if matches!(self.peek(1), Some('\'' | '"' | '\\')) => {
                    if let Some(escaped) = self.peek(1) {
                        value.push(escaped);
                    }
                    self.pos += 2;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
                None => {
                    return Err(RuleError::Lex {
                        kind: LexErrorKind::UnterminatedString,
                        offset: start,
                    });
                }
            }
        }
    }

    /// 读取数字：整数、小数，可带指数
    fn number(&mut self) -> Result<()> {
        let start_pos = self.pos;
        let offset = self.offset();
        if self.peek(0) == Some('-') {
            self.pos += 1;
        }

        let mut is_float = false;
        while let Some(c) = self.peek(0) {
            match c {
                '0'..='9' => self.pos += 1,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(c, 'e' | 'E') && matches!(self.peek(0), Some('+' | '-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        // 数字后紧跟标识符字符视为非法数字，如 `12abc`
        while self.peek(0).is_some_and(is_ident_char) {
            self.pos += 1;
        }

        let text = self.slice(start_pos, self.pos);
        let malformed = || RuleError::Lex {
            kind: LexErrorKind::MalformedNumber(text.to_string()),
            offset,
        };

        let kind = if is_float {
            let value: f64 = text.parse().map_err(|_| malformed())?;
            if !value.is_finite() {
                return Err(malformed());
            }
            TokenKind::Float(value)
        } else {
            TokenKind::Int(text.parse().map_err(|_| malformed())?)
        };

        self.push(kind, offset);
        Ok(())
    }

    /// 读取标识符、属性路径或关键字
    fn word(&mut self) -> Result<()> {
        let start_pos = self.pos;
        let offset = self.offset();
        let mut simple = true;

        self.ident();
        loop {
            match self.peek(0) {
                Some('.') if self.peek(1).is_some_and(is_ident_start) => {
                    simple = false;
                    self.pos += 1;
                    self.ident();
                }
                Some('[') => {
                    simple = false;
                    self.index()?;
                }
                _ => break,
            }
        }

        let text = self.slice(start_pos, self.pos);
        let kind = if simple {
            match text {
                "true" => TokenKind::Bool(true),
                "false" => TokenKind::Bool(false),
                word => match SpecialVerb::from_keyword(word) {
                    Some(verb) => TokenKind::Verb(verb),
                    None => TokenKind::Path(word.to_string()),
                },
            }
        } else {
            TokenKind::Path(text.to_string())
        };

        self.push(kind, offset);
        Ok(())
    }

    fn ident(&mut self) {
        while self.peek(0).is_some_and(is_ident_char) {
            self.pos += 1;
        }
    }

    /// 跳过路径中的 `[...]`，引号内的 `]` 不结束下标
    fn index(&mut self) -> Result<()> {
        let open = self.offset();
        self.pos += 1;

        loop {
            match self.peek(0) {
                Some(']') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some('\'' | '"') => {
                    self.string_literal()?;
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(RuleError::Lex {
                        kind: LexErrorKind::UnterminatedIndex,
                        offset: open,
                    });
                }
            }
        }
    }

    fn slice(&self, start_pos: usize, end_pos: usize) -> &'s str {
        let start = self
            .chars
            .get(start_pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len());
        let end = self
            .chars
            .get(end_pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len());
        &self.source[start..end]
    }
}

/// 便捷函数：对规则文本做词法分析
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            kinds("symbol == 'INTC'"),
            vec![
                TokenKind::Path("symbol".to_string()),
                TokenKind::Rel(RelationalOperator::Eq),
                TokenKind::Str("INTC".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_multi_char_operators() {
        assert_eq!(
            kinds("a<=1||b>=2&&c!=3"),
            vec![
                TokenKind::Path("a".to_string()),
                TokenKind::Rel(RelationalOperator::Le),
                TokenKind::Int(1),
                TokenKind::Logic(LogicalOperator::Or),
                TokenKind::Path("b".to_string()),
                TokenKind::Rel(RelationalOperator::Ge),
                TokenKind::Int(2),
                TokenKind::Logic(LogicalOperator::And),
                TokenKind::Path("c".to_string()),
                TokenKind::Rel(RelationalOperator::Ne),
                TokenKind::Int(3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quotes_hide_parens_and_other_quotes() {
        assert_eq!(
            kinds(r#"(b contains "it's (x]" || c == 'say "hi")')"#),
            vec![
                TokenKind::LParen,
                TokenKind::Path("b".to_string()),
                TokenKind::Verb(SpecialVerb::Contains),
                TokenKind::Str("it's (x]".to_string()),
                TokenKind::Logic(LogicalOperator::Or),
                TokenKind::Path("c".to_string()),
                TokenKind::Rel(RelationalOperator::Eq),
                TokenKind::Str("say \"hi\")".to_string()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(
            kinds(r"name == 'O\'Brien'")[2],
            TokenKind::Str("O'Brien".to_string())
        );
    }

    #[test]
    fn test_paths_with_indexes() {
        assert_eq!(
            kinds("k[0].n > g[4] && m['a]b'] == 1")[..3],
            [
                TokenKind::Path("k[0].n".to_string()),
                TokenKind::Rel(RelationalOperator::Gt),
                TokenKind::Path("g[4]".to_string()),
            ]
        );
        assert_eq!(
            kinds("m['a]b'] == 1")[0],
            TokenKind::Path("m['a]b']".to_string())
        );
    }

    #[test]
    fn test_numbers_and_signs() {
        assert_eq!(
            kinds("x > -5 && y - 2 == 1.5e2"),
            vec![
                TokenKind::Path("x".to_string()),
                TokenKind::Rel(RelationalOperator::Gt),
                TokenKind::Int(-5),
                TokenKind::Logic(LogicalOperator::And),
                TokenKind::Path("y".to_string()),
                TokenKind::Arith(ArithmeticOperator::Sub),
                TokenKind::Int(2),
                TokenKind::Rel(RelationalOperator::Eq),
                TokenKind::Float(150.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("tags sizeGE 2 && name notStartsWithCI 'x' && flag == true"),
            vec![
                TokenKind::Path("tags".to_string()),
                TokenKind::Verb(SpecialVerb::SizeGE),
                TokenKind::Int(2),
                TokenKind::Logic(LogicalOperator::And),
                TokenKind::Path("name".to_string()),
                TokenKind::Verb(SpecialVerb::NotStartsWithCI),
                TokenKind::Str("x".to_string()),
                TokenKind::Logic(LogicalOperator::And),
                TokenKind::Path("flag".to_string()),
                TokenKind::Rel(RelationalOperator::Eq),
                TokenKind::Bool(true),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_list_literal_tokens() {
        assert_eq!(
            kinds("s in ['a', 'b']"),
            vec![
                TokenKind::Path("s".to_string()),
                TokenKind::Verb(SpecialVerb::In),
                TokenKind::LBracket,
                TokenKind::Str("a".to_string()),
                TokenKind::Comma,
                TokenKind::Str("b".to_string()),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("a == 'x'").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 2, 5, 8]);
    }

    #[test]
    fn test_lex_errors() {
        let cases = [
            ("a == 'abc", 101),
            ("a = 1", 102),
            ("a == 1 & b == 2", 102),
            ("a == 1 | b == 2", 102),
            ("a == #", 102),
            ("a == 12abc", 103),
            ("a == 1.2.3", 103),
            ("a == 99999999999999999999", 103),
            ("m['x == 1", 101),
            ("m['x' == 1", 104),
            ("m[0 == 1", 104),
        ];

        for (source, code) in cases {
            let err = tokenize(source).unwrap_err();
            assert_eq!(err.code(), code, "source {:?}: {}", source, err);
        }
    }
}
