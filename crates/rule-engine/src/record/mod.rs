//! 记录能力接口
//!
//! 引擎不拥有记录的类型系统，只通过 [`Record`] 读取属性。
//! 内置两种实现：自有数据的 [`Tuple`] 与 JSON 对象适配。

mod json;
mod tuple;

pub use tuple::{Datum, Tuple};

use crate::value::Value;

/// 记录（元组）能力接口
pub trait Record {
    /// 按声明顺序列出顶层属性名
    fn attribute_names(&self) -> Vec<&str>;

    /// 属性的类型名称，如 `rstring`、`list<int64>`、`tuple<...>`
    fn attribute_type(&self, name: &str) -> Option<String>;

    /// 读取属性值（借用视图）
    fn attribute(&self, name: &str) -> Option<Value<'_>>;

    /// 文本形式的 schema 描述
    fn schema(&self) -> String {
        let fields: Vec<String> = self
            .attribute_names()
            .into_iter()
            .map(|name| {
                let ty = self
                    .attribute_type(name)
                    .unwrap_or_else(|| "unknown".to_string());
                format!("{} {}", ty, name)
            })
            .collect();
        format!("tuple<{}>", fields.join(","))
    }
}
