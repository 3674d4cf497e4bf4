//! 自有数据的元组实现

use super::Record;
use crate::value::Value;
use std::borrow::Cow;

/// 元组属性值
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Set(Vec<Datum>),
    List(Vec<Datum>),
    Map(Vec<(Datum, Datum)>),
    Tuple(Tuple),
}

impl Datum {
    /// 构造集合，重复元素只保留一个
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Datum>,
    {
        let mut unique: Vec<Datum> = Vec::new();
        for item in items {
            let item = item.into();
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self::Set(unique)
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Datum>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// 构造映射，重复键以后出现的为准
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Datum>,
        V: Into<Datum>,
    {
        let mut map: Vec<(Datum, Datum)> = Vec::new();
        for (k, v) in entries {
            let (k, v) = (k.into(), v.into());
            match map.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => map.push((k, v)),
            }
        }
        Self::Map(map)
    }

    /// 借用视图
    pub fn view(&self) -> Value<'_> {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(f) => Value::Float(*f),
            Self::Str(s) => Value::Str(Cow::Borrowed(s)),
            Self::Set(items) => Value::Set(items.iter().map(Datum::view).collect()),
            Self::List(items) => Value::List(items.iter().map(Datum::view).collect()),
            Self::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.view(), v.view()))
                    .collect(),
            ),
            Self::Tuple(tuple) => Value::Record(tuple),
        }
    }

    /// 类型名称；空集合的元素类型无法推断，记为 `unknown`
    pub fn type_name(&self) -> String {
        fn element_type(items: &[Datum]) -> String {
            items
                .first()
                .map(Datum::type_name)
                .unwrap_or_else(|| "unknown".to_string())
        }

        match self {
            Self::Bool(_) => "boolean".to_string(),
            Self::Int(_) => "int64".to_string(),
            Self::Float(_) => "float64".to_string(),
            Self::Str(_) => "rstring".to_string(),
            Self::Set(items) => format!("set<{}>", element_type(items)),
            Self::List(items) => format!("list<{}>", element_type(items)),
            Self::Map(entries) => match entries.first() {
                Some((k, v)) => format!("map<{},{}>", k.type_name(), v.type_name()),
                None => "map<unknown,unknown>".to_string(),
            },
            Self::Tuple(tuple) => tuple.schema(),
        }
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Datum {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Tuple> for Datum {
    fn from(v: Tuple) -> Self {
        Self::Tuple(v)
    }
}

impl<T: Into<Datum>> From<Vec<T>> for Datum {
    fn from(v: Vec<T>) -> Self {
        Self::list(v)
    }
}

/// 有序命名属性组成的元组
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tuple {
    attributes: Vec<(String, Datum)>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加属性
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Datum>) -> Self {
        self.insert(name, value);
        self
    }

    /// 设置属性，同名属性会被替换并保持原位置
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Datum>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Record for Tuple {
    fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn attribute_type(&self, name: &str) -> Option<String> {
        self.get(name).map(Datum::type_name)
    }

    fn attribute(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).map(Datum::view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut tuple = Tuple::new().with("a", 1).with("b", 2);
        tuple.insert("a", "x");

        assert_eq!(tuple.attribute_names(), vec!["a", "b"]);
        assert_eq!(tuple.get("a"), Some(&Datum::Str("x".to_string())));
    }

    #[test]
    fn test_set_deduplicates() {
        assert_eq!(
            Datum::set(["a", "b", "a"]),
            Datum::Set(vec![Datum::from("a"), Datum::from("b")])
        );
    }

    #[test]
    fn test_schema() {
        let tuple = Tuple::new()
            .with("symbol", "INTC")
            .with("price", 79.25)
            .with("quantity", 1287)
            .with("tags", Datum::set(["a"]))
            .with("empty", Datum::list(Vec::<i64>::new()))
            .with("inner", Tuple::new().with("flag", true));

        assert_eq!(
            tuple.schema(),
            "tuple<rstring symbol,float64 price,int64 quantity,set<rstring> tags,\
             list<unknown> empty,tuple<boolean flag> inner>"
        );
    }

    #[test]
    fn test_view_borrows_strings() {
        let tuple = Tuple::new().with("s", "hello");
        match tuple.attribute("s") {
            Some(Value::Str(Cow::Borrowed(s))) => assert_eq!(s, "hello"),
            other => panic!("unexpected value: {:?}", other),
        }
    }
}
