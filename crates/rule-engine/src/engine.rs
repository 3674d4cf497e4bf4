//! 规则引擎执行上下文
//!
//! 每个执行上下文持有一个 [`RuleEngine`]：引擎选项加上该上下文独占的编译规则缓存。
//! 所有入口都是同步调用，记录在单次调用期间以不可变借用方式传入。

use crate::cache::{CacheStats, RuleCache};
use crate::compare::{self, RecordComparison};
use crate::compiler::CompiledRule;
use crate::error::{Result, RuleError};
use crate::executor::RuleExecutor;
use crate::models::EvaluationResult;
use crate::parser::ParseOptions;
use crate::path::AttributePath;
use crate::record::Record;
use crate::resolver;
use crate::schema::{self, SchemaDescription};
use crate::value::{StringOrdering, Value};
use rule_shared::config::EngineConfig;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const EVALUATIONS: &str = "rule_evaluations_total";

/// 引擎选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub string_ordering: StringOrdering,
    pub max_nesting_depth: Option<usize>,
    /// 为 true 时所有调用都记录追踪
    pub debug_trace: bool,
}

impl TryFrom<&EngineConfig> for EngineOptions {
    type Error = RuleError;

    fn try_from(config: &EngineConfig) -> Result<Self> {
        let string_ordering = config
            .string_ordering
            .parse::<StringOrdering>()
            .map_err(|e: String| RuleError::Internal(format!("无效的引擎配置: {}", e)))?;

        Ok(Self {
            string_ordering,
            max_nesting_depth: config.max_nesting_depth,
            debug_trace: config.debug_trace,
        })
    }
}

/// 规则引擎
pub struct RuleEngine {
    options: EngineOptions,
    cache: RuleCache,
}

impl RuleEngine {
    pub fn new(options: EngineOptions) -> Self {
        let parse_options = ParseOptions {
            max_depth: options.max_nesting_depth,
        };
        Self {
            options,
            cache: RuleCache::with_options(parse_options),
        }
    }

    /// 从共享配置创建
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(EngineOptions::try_from(config)?))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 评估规则文本
    ///
    /// 返回的结果总是完整的：成功时 `error_code() == 0` 且 `matched` 为匹配结果，
    /// 失败时 `error` 给出首个错误，`matched` 无意义。
    #[instrument(skip(self, record), fields(cache_hit = tracing::field::Empty))]
    pub fn evaluate(
        &mut self,
        rule_text: &str,
        record: &dyn Record,
        debug_trace: bool,
    ) -> EvaluationResult {
        let executor = self.executor(debug_trace);

        let result = match self.cache.compile_or_fetch(rule_text) {
            Ok((rule, cache_hit)) => {
                tracing::Span::current().record("cache_hit", cache_hit);
                let mut result = executor.execute(&rule, record);
                result.cache_hit = cache_hit;
                result
            }
            Err(err) => EvaluationResult {
                error: Some(err),
                ..EvaluationResult::new()
            },
        };

        let outcome = match (&result.error, result.matched) {
            (Some(err), _) => {
                warn!(code = err.code(), kind = err.kind(), "规则评估失败: {}", err);
                "error"
            }
            (None, true) => "matched",
            (None, false) => "not_matched",
        };
        metrics::counter!(EVALUATIONS, "outcome" => outcome).increment(1);

        if executor.is_trace_enabled() {
            debug!(
                matched = result.matched,
                code = result.error_code(),
                elapsed_us = result.evaluation_time_us,
                "规则评估完成"
            );
        }

        result
    }

    /// 评估规则文本，以 `Result` 形式返回
    pub fn try_evaluate(&mut self, rule_text: &str, record: &dyn Record) -> Result<bool> {
        self.evaluate(rule_text, record, false).into_result()
    }

    /// 只编译（或从缓存取出）规则
    pub fn compile(&mut self, rule_text: &str) -> Result<Arc<CompiledRule>> {
        self.cache.compile_or_fetch(rule_text).map(|(rule, _)| rule)
    }

    /// 解析属性路径并读取值
    #[instrument(skip(self, record))]
    pub fn resolve_attribute<'r>(
        &self,
        path: &str,
        record: &'r dyn Record,
        debug_trace: bool,
    ) -> Result<Value<'r>> {
        let outcome = AttributePath::parse(path).and_then(|p| resolver::resolve(record, &p));

        if debug_trace || self.options.debug_trace {
            match &outcome {
                Ok(value) => debug!(kind = %value.kind(), "属性解析成功: {}", value),
                Err(err) => debug!(code = err.code(), "属性解析失败: {}", err),
            }
        }

        outcome
    }

    /// 比较两条记录
    #[instrument(skip_all)]
    pub fn compare_records(
        &self,
        left: &dyn Record,
        right: &dyn Record,
        debug_trace: bool,
    ) -> Result<RecordComparison> {
        let comparison = compare::compare_records(left, right)?;

        if debug_trace || self.options.debug_trace {
            debug!(
                matching = comparison.matching.len(),
                differing = ?comparison.differing,
                "记录比较完成"
            );
        }

        Ok(comparison)
    }

    /// 描述记录 schema
    pub fn describe_schema(&self, record: &dyn Record) -> SchemaDescription {
        schema::describe_schema(record)
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// 清空本上下文的规则缓存
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn executor(&self, debug_trace: bool) -> RuleExecutor {
        let executor = RuleExecutor::new().with_string_ordering(self.options.string_ordering);
        if debug_trace || self.options.debug_trace {
            executor.with_trace()
        } else {
            executor
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
