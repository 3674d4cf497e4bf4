//! 规则引擎错误类型
//!
//! 每种错误都对应一个稳定的数字错误码，0 表示成功。
//! 错误码分段：1xx 词法、2xx 语法、3xx 属性解析、4xx 求值、900 内部错误。

use std::fmt;
use thiserror::Error;

/// 成功（无错误）时的错误码
pub const SUCCESS: i32 = 0;

/// 词法错误类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnexpectedChar(char),
    MalformedNumber(String),
    UnterminatedIndex,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "字符串字面量未闭合"),
            Self::UnexpectedChar(c) => write!(f, "无法识别的字符 '{}'", c),
            Self::MalformedNumber(s) => write!(f, "无效的数字 '{}'", s),
            Self::UnterminatedIndex => write!(f, "下标括号未闭合"),
        }
    }
}

/// 语法错误类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnbalancedParenthesis,
    MismatchedQuote,
    MixedLogicalOperators { expected: String, found: String },
    UnknownOperator(String),
    MalformedLiteral(String),
    EmptySubexpression,
    UnexpectedToken(String),
    UnexpectedEnd,
    NestingTooDeep(usize),
    InvalidPath(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedParenthesis => write!(f, "括号不匹配"),
            Self::MismatchedQuote => write!(f, "引号不匹配"),
            Self::MixedLogicalOperators { expected, found } => write!(
                f,
                "同一层级混用逻辑操作符: 期望 {}, 实际 {}",
                expected, found
            ),
            Self::UnknownOperator(op) => write!(f, "未知的操作符 '{}'", op),
            Self::MalformedLiteral(lit) => write!(f, "无效的字面量 {}", lit),
            Self::EmptySubexpression => write!(f, "子表达式为空"),
            Self::UnexpectedToken(tok) => write!(f, "意外的记号 {}", tok),
            Self::UnexpectedEnd => write!(f, "规则意外结束"),
            Self::NestingTooDeep(max) => write!(f, "嵌套层数超过上限 {}", max),
            Self::InvalidPath(path) => write!(f, "无效的属性路径 '{}'", path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("词法错误 (偏移 {offset}): {kind}")]
    Lex { kind: LexErrorKind, offset: usize },

    #[error("语法错误 (偏移 {offset}, 附近 '{context}'): {kind}")]
    Parse {
        kind: ParseErrorKind,
        offset: usize,
        context: String,
    },

    #[error("属性不存在: {path} (缺失段 '{segment}')")]
    AttributeNotFound { path: String, segment: String },

    #[error("下标越界: {path} 下标 {index}, 长度 {len}")]
    IndexOutOfRange { path: String, index: i64, len: usize },

    #[error("键不存在: {path} 键 {key}")]
    KeyNotFound { path: String, key: String },

    #[error("无法访问: {path} 的段 '{segment}' 作用于类型 {actual}")]
    IndexTypeMismatch {
        path: String,
        segment: String,
        actual: String,
    },

    #[error("类型不匹配: {operator} 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        operator: String,
        expected: String,
        actual: String,
    },

    #[error("无效的操作符: {operator} 不支持类型 {value_type}")]
    InvalidOperator {
        operator: String,
        value_type: String,
    },

    #[error("除零错误: {operator}")]
    DivisionByZero { operator: String },

    #[error("算术溢出: {operator}")]
    ArithmeticOverflow { operator: String },

    #[error("内部错误: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// 构造语法错误，附带出错位置附近的规则文本
    pub fn parse(kind: ParseErrorKind, offset: usize, source: &str) -> Self {
        Self::Parse {
            kind,
            offset,
            context: snippet(source, offset),
        }
    }

    /// 获取数字错误码
    pub fn code(&self) -> i32 {
        match self {
            Self::Lex { kind, .. } => match kind {
                LexErrorKind::UnterminatedString => 101,
                LexErrorKind::UnexpectedChar(_) => 102,
                LexErrorKind::MalformedNumber(_) => 103,
                LexErrorKind::UnterminatedIndex => 104,
            },
            Self::Parse { kind, .. } => match kind {
                ParseErrorKind::UnbalancedParenthesis => 201,
                ParseErrorKind::MismatchedQuote => 202,
                ParseErrorKind::MixedLogicalOperators { .. } => 203,
                ParseErrorKind::UnknownOperator(_) => 204,
                ParseErrorKind::MalformedLiteral(_) => 205,
                ParseErrorKind::EmptySubexpression => 206,
                ParseErrorKind::UnexpectedToken(_) => 207,
                ParseErrorKind::UnexpectedEnd => 208,
                ParseErrorKind::NestingTooDeep(_) => 209,
                ParseErrorKind::InvalidPath(_) => 210,
            },
            Self::AttributeNotFound { .. } => 301,
            Self::IndexOutOfRange { .. } => 302,
            Self::KeyNotFound { .. } => 303,
            Self::IndexTypeMismatch { .. } => 304,
            Self::TypeMismatch { .. } => 401,
            Self::InvalidOperator { .. } => 402,
            Self::DivisionByZero { .. } => 403,
            Self::ArithmeticOverflow { .. } => 404,
            Self::Internal(_) => 900,
        }
    }

    /// 获取错误类别名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lex { .. } => "LEX_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::AttributeNotFound { .. } => "ATTRIBUTE_NOT_FOUND",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::KeyNotFound { .. } => "KEY_NOT_FOUND",
            Self::IndexTypeMismatch { .. } => "INDEX_TYPE_MISMATCH",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::InvalidOperator { .. } => "INVALID_OPERATOR",
            Self::DivisionByZero { .. } => "DIVISION_BY_ZERO",
            Self::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否发生在编译阶段（词法或语法错误）
    pub fn is_compile_error(&self) -> bool {
        matches!(self, Self::Lex { .. } | Self::Parse { .. })
    }

    /// 是否为属性解析错误
    pub fn is_resolution_error(&self) -> bool {
        matches!(self.code(), 301..=304)
    }
}

/// 截取 offset 附近的文本用于诊断
fn snippet(source: &str, offset: usize) -> String {
    const RADIUS: usize = 12;

    let mut start = offset.saturating_sub(RADIUS);
    while start > 0 && !source.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + RADIUS).min(source.len());
    while end < source.len() && !source.is_char_boundary(end) {
        end += 1;
    }
    source[start..end].to_string()
}
