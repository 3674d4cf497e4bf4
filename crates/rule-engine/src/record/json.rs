//! JSON 对象作为记录
//!
//! 对象映射为嵌套元组，数组映射为 List，整数映射为 int64，其余数字映射为 float64。
//! `null` 属性视为不存在；含 `null` 元素的数组整体不可读，以免下标错位。

use super::Record;
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;

type JsonObject = Map<String, JsonValue>;

fn json_view(value: &JsonValue) -> Option<Value<'_>> {
    let view = match value {
        JsonValue::Null => return None,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64()?),
        },
        JsonValue::String(s) => Value::Str(Cow::Borrowed(s)),
        JsonValue::Array(items) => {
            Value::List(items.iter().map(json_view).collect::<Option<Vec<_>>>()?)
        }
        JsonValue::Object(map) => Value::Record(map),
    };
    Some(view)
}

/// 值能否映射为 [`Value`]：`null` 与含不可读元素的数组不可读
fn is_readable(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Number(n) => n.as_i64().is_some() || n.as_f64().is_some(),
        JsonValue::Array(items) => items.iter().all(is_readable),
        _ => true,
    }
}

fn json_type_name(value: &JsonValue) -> Option<String> {
    if !is_readable(value) {
        return None;
    }
    let name = match value {
        JsonValue::Null => return None,
        JsonValue::Bool(_) => "boolean".to_string(),
        JsonValue::Number(n) if n.is_i64() => "int64".to_string(),
        JsonValue::Number(_) => "float64".to_string(),
        JsonValue::String(_) => "rstring".to_string(),
        JsonValue::Array(items) => format!(
            "list<{}>",
            items
                .iter()
                .find_map(json_type_name)
                .unwrap_or_else(|| "unknown".to_string())
        ),
        JsonValue::Object(map) => map.schema(),
    };
    Some(name)
}

impl Record for JsonObject {
    fn attribute_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, v)| is_readable(v))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    fn attribute_type(&self, name: &str) -> Option<String> {
        self.get(name).and_then(json_type_name)
    }

    fn attribute(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).and_then(json_view)
    }
}
