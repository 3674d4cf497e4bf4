//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑，结果以 JSON 输出到标准输出。

use std::fs;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;

use crate::engine::RuleEngine;
use crate::models::EvaluationResult;

type JsonObject = Map<String, JsonValue>;

/// 命令执行器
///
/// 持有一个执行上下文（引擎与其规则缓存），所有子命令共用。
pub struct CommandRunner {
    engine: RuleEngine,
}

impl CommandRunner {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    /// 执行 eval 命令
    pub fn run_eval(&mut self, rules: &[String], record: &str, trace: bool) -> Result<JsonValue> {
        let record = load_record(record)?;

        let results: Vec<JsonValue> = rules
            .iter()
            .map(|rule| {
                let result = self.engine.evaluate(rule, &record, trace);
                evaluation_json(rule, &result)
            })
            .collect();

        let stats = self.engine.cache_stats();
        info!(
            rules = rules.len(),
            hits = stats.hits,
            misses = stats.misses,
            "规则评估完成"
        );

        Ok(json!({ "results": results, "cache": stats }))
    }

    /// 执行 resolve 命令
    pub fn run_resolve(&self, path: &str, record: &str) -> Result<JsonValue> {
        let record = load_record(record)?;

        let output = match self.engine.resolve_attribute(path, &record, false) {
            Ok(value) => json!({
                "path": path,
                "value": value.to_json(),
                "type": value.kind().to_string(),
                "error_code": 0,
            }),
            Err(err) => json!({
                "path": path,
                "error_code": err.code(),
                "error": err.to_string(),
            }),
        };
        Ok(output)
    }

    /// 执行 compare 命令
    pub fn run_compare(&self, left: &str, right: &str) -> Result<JsonValue> {
        let left = load_record(left)?;
        let right = load_record(right)?;

        let comparison = self
            .engine
            .compare_records(&left, &right, false)
            .context("记录比较失败")?;
        Ok(serde_json::to_value(comparison)?)
    }

    /// 执行 schema 命令
    pub fn run_schema(&self, record: &str) -> Result<JsonValue> {
        let record = load_record(record)?;
        Ok(serde_json::to_value(self.engine.describe_schema(&record))?)
    }

    /// 执行 explain 命令
    pub fn run_explain(&mut self, rule: &str) -> Result<JsonValue> {
        let compiled = match self.engine.compile(rule) {
            Ok(compiled) => compiled,
            Err(err) => {
                return Ok(json!({
                    "rule": rule,
                    "error_code": err.code(),
                    "error": err.to_string(),
                }));
            }
        };

        Ok(json!({
            "rule": rule,
            "canonical": compiled.root.to_string(),
            "required_fields": compiled.required_fields,
            "depth": compiled.root.depth(),
            "tree": serde_json::to_value(&compiled.root)?,
            "error_code": 0,
        }))
    }
}

fn evaluation_json(rule: &str, result: &EvaluationResult) -> JsonValue {
    let mut output = json!({
        "rule": rule,
        "matched": result.matched,
        "error_code": result.error_code(),
        "cache_hit": result.cache_hit,
        "elapsed_us": result.evaluation_time_us,
    });
    if let Some(err) = &result.error {
        output["error"] = JsonValue::String(err.to_string());
    }
    if !result.evaluation_trace.is_empty() {
        output["trace"] = json!(result.evaluation_trace);
    }
    output
}

/// 读取记录参数：内联 JSON 对象，或以 `@` 开头的文件路径
fn load_record(arg: &str) -> Result<JsonObject> {
    let content = match arg.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("读取记录文件失败: {}", path))?
        }
        None => arg.to_string(),
    };

    match serde_json::from_str::<JsonValue>(&content).context("解析 JSON 记录失败")? {
        JsonValue::Object(map) => Ok(map),
        other => bail!("记录必须是 JSON 对象，实际为: {}", json_kind(&other)),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
