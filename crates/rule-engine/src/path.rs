//! 属性路径
//!
//! 路径由点号分隔的属性段和方括号下标组成，例如 `a.transport.plane.airliner`、
//! `g[4]`、`k[0].n`、`m['key']`。路径结构在编译时解析一次，每次评估时针对具体记录求值。

use crate::error::{ParseErrorKind, Result, RuleError};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 方括号中的下标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// 路径段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Attr(String),
    Index(IndexKey),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(name) => write!(f, "{}", name),
            Self::Index(key) => write!(f, "[{}]", key),
        }
    }
}

/// 已解析的属性路径
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    text: String,
    segments: Vec<PathSegment>,
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl AttributePath {
    /// 解析路径文本
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_at(text, 0, text)
    }

    /// 解析嵌入在规则文本中的路径，错误偏移以规则文本为准
    pub(crate) fn parse_at(text: &str, base: usize, source: &str) -> Result<Self> {
        let segments = parse_segments(text)
            .map_err(|(kind, offset)| RuleError::parse(kind, base + offset, source))?;
        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// 顶层属性名
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Attr(name)) => name,
            _ => "",
        }
    }
}

type SegmentResult<T> = std::result::Result<T, (ParseErrorKind, usize)>;

fn parse_segments(text: &str) -> SegmentResult<Vec<PathSegment>> {
    let invalid = |offset: usize| (ParseErrorKind::InvalidPath(text.to_string()), offset);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> SegmentResult<String> {
        let start = *i;
        match chars.get(*i) {
            Some((_, c)) if is_ident_start(*c) => *i += 1,
            Some((offset, _)) => return Err(invalid(*offset)),
            None => return Err(invalid(text.len())),
        }
        while chars.get(*i).is_some_and(|(_, c)| is_ident_char(*c)) {
            *i += 1;
        }
        Ok(chars[start..*i].iter().map(|(_, c)| c).collect())
    };

    segments.push(PathSegment::Attr(read_ident(&mut i)?));

    while let Some(&(offset, c)) = chars.get(i) {
        match c {
            '.' => {
                i += 1;
                segments.push(PathSegment::Attr(read_ident(&mut i)?));
            }
            '[' => {
                i += 1;
                let key = read_index(&chars, &mut i, text)?;
                segments.push(PathSegment::Index(key));
            }
            _ => return Err(invalid(offset)),
        }
    }

    Ok(segments)
}

fn read_index(chars: &[(usize, char)], i: &mut usize, text: &str) -> SegmentResult<IndexKey> {
    let invalid = |offset: usize| (ParseErrorKind::InvalidPath(text.to_string()), offset);
    let skip_ws = |i: &mut usize| {
        while chars.get(*i).is_some_and(|(_, c)| c.is_whitespace()) {
            *i += 1;
        }
    };

    skip_ws(i);
    let key = match chars.get(*i) {
        Some(&(offset, quote @ ('\'' | '"'))) => {
            *i += 1;
            let mut key = String::new();
            loop {
                match chars.get(*i) {
                    Some(&(_, c)) if c == quote => {
                        *i += 1;
                        break;
                    }
                    // 与字符串字面量一致：只转义 `\'`、`\"`、`\\`
                    Some(&(_, '\\'))
                        if matches!(chars.get(*i + 1), Some((_, '\'' | '"' | '\\'))) =>
                    {
                        key.push(chars[*i + 1].1);
                        *i += 2;
                    }
                    Some(&(_, c)) => {
                        key.push(c);
                        *i += 1;
                    }
                    None => return Err((ParseErrorKind::MismatchedQuote, offset)),
                }
            }
            IndexKey::Str(key)
        }
        Some(&(offset, c)) if c.is_ascii_digit() || c == '-' => {
            let start = *i;
            *i += 1;
            while chars.get(*i).is_some_and(|(_, c)| c.is_ascii_digit()) {
                *i += 1;
            }
            let digits: String = chars[start..*i].iter().map(|(_, c)| c).collect();
            let n = digits.parse::<i64>().map_err(|_| invalid(offset))?;
            IndexKey::Int(n)
        }
        Some(&(_, c)) if is_ident_start(c) => {
            let start = *i;
            while chars.get(*i).is_some_and(|(_, c)| is_ident_char(*c)) {
                *i += 1;
            }
            IndexKey::Str(chars[start..*i].iter().map(|(_, c)| c).collect())
        }
        Some(&(offset, _)) => return Err(invalid(offset)),
        None => return Err(invalid(text.len())),
    };
    skip_ws(i);

    match chars.get(*i) {
        Some((_, ']')) => {
            *i += 1;
            Ok(key)
        }
        Some(&(offset, _)) => Err(invalid(offset)),
        None => Err(invalid(text.len())),
    }
}

impl FromStr for AttributePath {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> PathSegment {
        PathSegment::Attr(name.to_string())
    }

    #[test]
    fn test_dotted_path() {
        let path = AttributePath::parse("a.transport.plane.airliner").unwrap();
        assert_eq!(
            path.segments(),
            &[attr("a"), attr("transport"), attr("plane"), attr("airliner")]
        );
        assert_eq!(path.root(), "a");
    }

    #[test]
    fn test_indexed_paths() {
        let path = AttributePath::parse("k[0].n").unwrap();
        assert_eq!(
            path.segments(),
            &[attr("k"), PathSegment::Index(IndexKey::Int(0)), attr("n")]
        );

        let path = AttributePath::parse("m['a]b'][ 3 ]").unwrap();
        assert_eq!(
            path.segments(),
            &[
                attr("m"),
                PathSegment::Index(IndexKey::Str("a]b".to_string())),
                PathSegment::Index(IndexKey::Int(3)),
            ]
        );

        let path = AttributePath::parse("m[key]").unwrap();
        assert_eq!(
            path.segments()[1],
            PathSegment::Index(IndexKey::Str("key".to_string()))
        );
    }

    #[test]
    fn test_unicode_identifiers() {
        let path = AttributePath::parse("用户.等级").unwrap();
        assert_eq!(path.segments(), &[attr("用户"), attr("等级")]);
    }

    #[test]
    fn test_invalid_paths() {
        for text in ["", "a.", "a..b", "1a", "a[", "a[]", "a[1", "a b", "a.[0]"] {
            let err = AttributePath::parse(text).unwrap_err();
            assert_eq!(err.code(), 210, "path {:?}", text);
        }
    }

    #[test]
    fn test_index_key_escapes_match_string_literals() {
        use crate::lexer::{TokenKind, tokenize};

        for key in [r"a\n", r"it\'s", r#"q\"x"#, r"back\\slash", r"t\tab"] {
            let path = AttributePath::parse(&format!("m['{}']", key)).unwrap();
            let tokens = tokenize(&format!("'{}'", key)).unwrap();
            let TokenKind::Str(literal) = &tokens[0].kind else {
                panic!("expected string literal for {:?}", key);
            };
            assert_eq!(
                path.segments()[1],
                PathSegment::Index(IndexKey::Str(literal.clone())),
                "key {:?}",
                key
            );
        }

        let path = AttributePath::parse(r"m['a\n']").unwrap();
        assert_eq!(
            path.segments()[1],
            PathSegment::Index(IndexKey::Str("a\\n".to_string()))
        );
    }

    #[test]
    fn test_mismatched_quote() {
        let err = AttributePath::parse("m['abc]").unwrap_err();
        assert_eq!(err.code(), 202);
    }
}
