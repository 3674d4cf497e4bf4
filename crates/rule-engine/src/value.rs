//! 值模型
//!
//! 引擎处理的所有值都表示为 [`Value`]。字符串和嵌套记录以借用方式引用调用方的记录，
//! 生命周期不超过一次调用。

use crate::record::Record;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 值的类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    Set,
    List,
    Map,
    Record,
}

impl ValueKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    pub fn is_collection(self) -> bool {
        matches!(self, Self::Set | Self::List | Self::Map)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "boolean",
            Self::Int => "int64",
            Self::Float => "float64",
            Self::Str => "rstring",
            Self::Set => "set",
            Self::List => "list",
            Self::Map => "map",
            Self::Record => "tuple",
        };
        write!(f, "{}", s)
    }
}

/// 运行时值
#[derive(Clone)]
pub enum Value<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    Set(Vec<Value<'a>>),
    List(Vec<Value<'a>>),
    Map(Vec<(Value<'a>, Value<'a>)>),
    Record(&'a dyn Record),
}

impl<'a> Value<'a> {
    pub fn str(s: &'a str) -> Self {
        Self::Str(Cow::Borrowed(s))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Set(_) => ValueKind::Set,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
            Self::Record(_) => ValueKind::Record,
        }
    }

    /// 数值拓宽为 f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// 集合基数（Set/List/Map），其他类型返回 None
    pub fn cardinality(&self) -> Option<usize> {
        match self {
            Self::Set(items) | Self::List(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// 大小写折叠：字符串转为小写，集合逐元素折叠，其他值原样返回
    pub fn fold_case(&self) -> Value<'a> {
        match self {
            Self::Str(s) => Self::Str(Cow::Owned(s.to_lowercase())),
            Self::Set(items) => Self::Set(items.iter().map(Value::fold_case).collect()),
            Self::List(items) => Self::List(items.iter().map(Value::fold_case).collect()),
            Self::Map(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.fold_case(), v.fold_case()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// 结构相等
    ///
    /// 数值按拓宽后比较；List 按顺序逐元素；Set 不关心顺序；
    /// Map 按键查找；Record 要求属性名集合相同且各属性结构相等。
    pub fn structural_eq(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Self::Bool(a), Value::Bool(b)) => a == b,
            (Self::Int(a), Value::Int(b)) => a == b,
            (Self::Str(a), Value::Str(b)) => a == b,
            (Self::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
            }
            (Self::Set(a), Value::Set(b)) => {
                a.len() == b.len()
                    && a.iter().all(|x| b.iter().any(|y| x.structural_eq(y)))
                    && b.iter().all(|y| a.iter().any(|x| x.structural_eq(y)))
            }
            (Self::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .find(|(k2, _)| k.structural_eq(k2))
                            .is_some_and(|(_, v2)| v.structural_eq(v2))
                    })
            }
            (Self::Record(a), Value::Record(b)) => records_equal(*a, *b),
            (a, b) if a.kind().is_numeric() && b.kind().is_numeric() => {
                a.as_f64() == b.as_f64()
            }
            _ => false,
        }
    }

    /// 转换为 JSON，用于命令行输出
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Str(s) => JsonValue::String(s.to_string()),
            Self::Set(items) | Self::List(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Map(entries) => {
                if entries.iter().all(|(k, _)| matches!(k, Value::Str(_))) {
                    let map: JsonMap<String, JsonValue> = entries
                        .iter()
                        .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.to_json())))
                        .collect();
                    JsonValue::Object(map)
                } else {
                    JsonValue::Array(
                        entries
                            .iter()
                            .map(|(k, v)| JsonValue::Array(vec![k.to_json(), v.to_json()]))
                            .collect(),
                    )
                }
            }
            Self::Record(record) => {
                let map: JsonMap<String, JsonValue> = record
                    .attribute_names()
                    .into_iter()
                    .filter_map(|name| {
                        record
                            .attribute(name)
                            .map(|value| (name.to_string(), value.to_json()))
                    })
                    .collect();
                JsonValue::Object(map)
            }
        }
    }
}

fn records_equal(a: &dyn Record, b: &dyn Record) -> bool {
    let names = a.attribute_names();
    let other_names = b.attribute_names();
    if names.len() != other_names.len() {
        return false;
    }

    names.into_iter().all(|name| match (a.attribute(name), b.attribute(name)) {
        (Some(x), Some(y)) => x.structural_eq(&y),
        _ => false,
    })
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Record(record) => f.debug_tuple("Record").field(&record.schema()).finish(),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value<'_>]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Set(items) => {
                write!(f, "{{")?;
                write_items(f, items)?;
                write!(f, "}}")
            }
            Self::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Self::Record(record) => {
                write!(f, "{{")?;
                for (i, name) in record.attribute_names().into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match record.attribute(name) {
                        Some(value) => write!(f, "{}={}", name, value)?,
                        None => write!(f, "{}=?", name)?,
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

/// 字符串关系比较方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringOrdering {
    /// 按 UTF-8 字节序比较
    #[default]
    Ordinal,
    /// 先折叠为小写再按字节序比较
    CaseInsensitive,
}

impl StringOrdering {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Ordinal => a.cmp(b),
            Self::CaseInsensitive => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl FromStr for StringOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinal" | "byte" | "bytewise" => Ok(Self::Ordinal),
            "case_insensitive" | "ci" => Ok(Self::CaseInsensitive),
            other => Err(format!("unknown string ordering '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Datum, Tuple};

    #[test]
    fn test_numeric_widening_equality() {
        assert_eq!(Value::Int(7), Value::Float(7.0));
        assert_ne!(Value::Int(7), Value::Float(7.5));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Value::Set(vec![Value::str("C++"), Value::str("SPL")]);
        let b = Value::Set(vec![Value::str("SPL"), Value::str("C++")]);
        assert_eq!(a, b);

        let list_a = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let list_b = Value::List(vec![Value::Int(2), Value::Int(1)]);
        assert_ne!(list_a, list_b);
    }

    #[test]
    fn test_map_equality() {
        let a = Value::Map(vec![
            (Value::str("x"), Value::Int(1)),
            (Value::str("y"), Value::Int(2)),
        ]);
        let b = Value::Map(vec![
            (Value::str("y"), Value::Int(2)),
            (Value::str("x"), Value::Int(1)),
        ]);
        let c = Value::Map(vec![
            (Value::str("y"), Value::Int(3)),
            (Value::str("x"), Value::Int(1)),
        ]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_record_equality() {
        let t1 = Tuple::new().with("a", 1).with("b", "x");
        let t2 = Tuple::new().with("a", 1).with("b", "x");
        let t3 = Tuple::new().with("a", 1).with("b", "y");

        assert_eq!(Value::Record(&t1), Value::Record(&t2));
        assert_ne!(Value::Record(&t1), Value::Record(&t3));
    }

    #[test]
    fn test_fold_case() {
        let v = Value::List(vec![Value::str("ABC"), Value::Int(1)]);
        assert_eq!(
            v.fold_case(),
            Value::List(vec![Value::str("abc"), Value::Int(1)])
        );
    }

    #[test]
    fn test_cardinality() {
        let tuple = Tuple::new()
            .with("s", Datum::set(["a", "b"]))
            .with("m", Datum::map([("k", 1)]));
        assert_eq!(tuple.attribute("s").unwrap().cardinality(), Some(2));
        assert_eq!(tuple.attribute("m").unwrap().cardinality(), Some(1));
        assert_eq!(Value::str("abc").cardinality(), None);
    }

    #[test]
    fn test_display() {
        let v = Value::List(vec![Value::Int(1), Value::Float(2.5), Value::str("x")]);
        assert_eq!(v.to_string(), r#"[1, 2.5, "x"]"#);
        assert_eq!(ValueKind::Str.to_string(), "rstring");
    }

    #[test]
    fn test_to_json() {
        let tuple = Tuple::new()
            .with("n", 3)
            .with("tags", vec!["a", "b"])
            .with("m", Datum::map([(1, "one")]));
        let json = Value::Record(&tuple).to_json();

        assert_eq!(
            json,
            serde_json::json!({"n": 3, "tags": ["a", "b"], "m": [[1, "one"]]})
        );
    }

    #[test]
    fn test_string_ordering() {
        assert_eq!(StringOrdering::Ordinal.compare("B", "a"), Ordering::Less);
        assert_eq!(
            StringOrdering::CaseInsensitive.compare("B", "a"),
            Ordering::Greater
        );
        assert_eq!(
            "case_insensitive".parse::<StringOrdering>(),
            Ok(StringOrdering::CaseInsensitive)
        );
        assert!("locale".parse::<StringOrdering>().is_err());
    }
}
