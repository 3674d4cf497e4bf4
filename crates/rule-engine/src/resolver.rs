//! 属性解析器
//!
//! 沿路径逐段下降：属性段进入嵌套记录（包括列表元素中的记录），
//! 下标段按位置访问 List 或按键访问 Map。

use crate::error::{Result, RuleError};
use crate::path::{AttributePath, IndexKey, PathSegment};
use crate::record::Record;
use crate::value::Value;

/// 针对记录解析属性路径
pub fn resolve<'a>(record: &'a dyn Record, path: &AttributePath) -> Result<Value<'a>> {
    let mut current = Value::Record(record);

    for segment in path.segments() {
        current = step(current, segment, path)?;
    }

    Ok(current)
}

fn step<'a>(current: Value<'a>, segment: &PathSegment, path: &AttributePath) -> Result<Value<'a>> {
    match (segment, current) {
        (PathSegment::Attr(name), Value::Record(record)) => {
            record
                .attribute(name)
                .ok_or_else(|| RuleError::AttributeNotFound {
                    path: path.to_string(),
                    segment: name.clone(),
                })
        }
        (PathSegment::Index(IndexKey::Int(index)), Value::List(items)) => {
            let len = items.len();
            usize::try_from(*index)
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .ok_or_else(|| RuleError::IndexOutOfRange {
                    path: path.to_string(),
                    index: *index,
                    len,
                })
        }
        (PathSegment::Index(key), Value::Map(entries)) => {
            let wanted = match key {
                IndexKey::Int(i) => Value::Int(*i),
                IndexKey::Str(s) => Value::str(s),
            };
            entries
                .into_iter()
                .find(|(k, _)| k.structural_eq(&wanted))
                .map(|(_, v)| v)
                .ok_or_else(|| RuleError::KeyNotFound {
                    path: path.to_string(),
                    key: key.to_string(),
                })
        }
        (segment, other) => Err(RuleError::IndexTypeMismatch {
            path: path.to_string(),
            segment: segment.to_string(),
            actual: other.kind().to_string(),
        }),
    }
}
