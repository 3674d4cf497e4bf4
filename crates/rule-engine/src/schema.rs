//! 记录 schema 描述

use crate::record::Record;
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// schema 描述：完整的 schema 文本和每个属性（含嵌套元组的点号路径）的类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescription {
    pub schema_literal: String,
    pub attribute_types: BTreeMap<String, String>,
}

impl SchemaDescription {
    pub fn type_of(&self, path: &str) -> Option<&str> {
        self.attribute_types.get(path).map(String::as_str)
    }
}

/// 描述记录的 schema
pub fn describe_schema(record: &dyn Record) -> SchemaDescription {
    let mut attribute_types = BTreeMap::new();
    collect_types(record, "", &mut attribute_types);

    SchemaDescription {
        schema_literal: record.schema(),
        attribute_types,
    }
}

fn collect_types(record: &dyn Record, prefix: &str, out: &mut BTreeMap<String, String>) {
    for name in record.attribute_names() {
        let path = format!("{}{}", prefix, name);
        let ty = record
            .attribute_type(name)
            .unwrap_or_else(|| "unknown".to_string());
        out.insert(path.clone(), ty);

        if let Some(Value::Record(nested)) = record.attribute(name) {
            collect_types(nested, &format!("{}.", path), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Datum, Tuple};

    #[test]
    fn test_flat_schema() {
        let record = Tuple::new()
            .with("symbol", "INTC")
            .with("price", 79.25)
            .with("quantity", 1287);

        let schema = describe_schema(&record);
        assert_eq!(
            schema.schema_literal,
            "tuple<rstring symbol,float64 price,int64 quantity>"
        );
        assert_eq!(schema.attribute_types.len(), 3);
        assert_eq!(schema.type_of("price"), Some("float64"));
    }

    #[test]
    fn test_nested_schema() {
        let plane = Tuple::new().with("airliner", "A380");
        let record = Tuple::new()
            .with("a", Tuple::new().with("plane", plane))
            .with("skills", Datum::set(["SPL"]));

        let schema = describe_schema(&record);
        assert_eq!(
            schema.type_of("a"),
            Some("tuple<tuple<rstring airliner> plane>")
        );
        assert_eq!(schema.type_of("a.plane"), Some("tuple<rstring airliner>"));
        assert_eq!(schema.type_of("a.plane.airliner"), Some("rstring"));
        assert_eq!(schema.type_of("skills"), Some("set<rstring>"));
    }

    #[test]
    fn test_json_schema() {
        let value = serde_json::json!({"id": 11, "tags": ["x"], "user": {"vip": true}});
        let serde_json::Value::Object(record) = value else {
            panic!("expected object");
        };

        let schema = describe_schema(&record);
        assert_eq!(
            schema.schema_literal,
            "tuple<int64 id,list<rstring> tags,tuple<boolean vip> user>"
        );
        assert_eq!(schema.type_of("user.vip"), Some("boolean"));
    }
}
