//! 记录比较
//!
//! 按第一条记录的 schema 顺序深度优先比较两条记录，嵌套元组递归展开为点号路径，
//! 集合作为整体按结构相等比较。只出现在其中一条记录中的属性计入不同项。

use crate::error::{Result, RuleError};
use crate::record::Record;
use crate::value::Value;
use serde::Serialize;

/// 比较结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordComparison {
    /// 值相同的属性路径
    pub matching: Vec<String>,
    /// 值不同（或只存在于一侧）的属性路径
    pub differing: Vec<String>,
}

impl RecordComparison {
    pub fn is_identical(&self) -> bool {
        self.differing.is_empty()
    }
}

/// 比较两条记录
pub fn compare_records(left: &dyn Record, right: &dyn Record) -> Result<RecordComparison> {
    let mut comparison = RecordComparison::default();
    compare_into(left, right, "", &mut comparison)?;
    Ok(comparison)
}

fn compare_into(
    left: &dyn Record,
    right: &dyn Record,
    prefix: &str,
    out: &mut RecordComparison,
) -> Result<()> {
    let left_names = left.attribute_names();

    for &name in &left_names {
        let path = format!("{}{}", prefix, name);
        let left_value = fetch(left, name, &path)?;

        let Some(right_value) = right.attribute(name) else {
            out.differing.push(path);
            continue;
        };

        match (&left_value, &right_value) {
            (Value::Record(l), Value::Record(r)) => {
                compare_into(*l, *r, &format!("{}.", path), out)?;
            }
            (l, r) if l.structural_eq(r) => out.matching.push(path),
            _ => out.differing.push(path),
        }
    }

    // 只存在于第二条记录中的属性
    for name in right.attribute_names() {
        if !left_names.contains(&name) {
            out.differing.push(format!("{}{}", prefix, name));
        }
    }

    Ok(())
}

fn fetch<'r>(record: &'r dyn Record, name: &str, path: &str) -> Result<Value<'r>> {
    record.attribute(name).ok_or_else(|| {
        RuleError::Internal(format!("属性 {} 已列出但无法读取", path))
    })
}
