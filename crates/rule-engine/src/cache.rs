//! 编译规则缓存
//!
//! 以规则原文为键缓存编译结果，不做任何规范化：文本只要有一个字符不同就是不同的键。
//! 缓存归单个执行上下文所有，通过 `&mut self` 修改，不跨线程共享。
//! 条目在插入后不再修改，也不会被淘汰，直到显式调用 [`RuleCache::clear`]。

use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::Result;
use crate::parser::ParseOptions;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const CACHE_HITS: &str = "rule_cache_hits_total";
const CACHE_MISSES: &str = "rule_cache_misses_total";

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// 编译规则缓存
pub struct RuleCache {
    entries: HashMap<String, Arc<CompiledRule>>,
    compiler: RuleCompiler,
    hits: u64,
    misses: u64,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            entries: HashMap::new(),
            compiler: RuleCompiler::with_options(options),
            hits: 0,
            misses: 0,
        }
    }

    /// 获取当前缓存的规则数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 检查规则文本是否已缓存
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// 获取已缓存的规则，不触发编译
    pub fn get(&self, text: &str) -> Option<Arc<CompiledRule>> {
        self.entries.get(text).cloned()
    }

    /// 查找或编译规则，返回 (编译结果, 是否命中缓存)
    ///
    /// 编译失败时不插入任何条目，下次以相同文本调用会重新编译并得到相同错误。
    #[instrument(skip(self), fields(cached = self.entries.len()))]
    pub fn compile_or_fetch(&mut self, text: &str) -> Result<(Arc<CompiledRule>, bool)> {
        if let Some(rule) = self.entries.get(text) {
            self.hits += 1;
            metrics::counter!(CACHE_HITS).increment(1);
            debug!("规则缓存命中");
            return Ok((Arc::clone(rule), true));
        }

        self.misses += 1;
        metrics::counter!(CACHE_MISSES).increment(1);

        let compiled = match self.compiler.compile(text) {
            Ok(compiled) => Arc::new(compiled),
            Err(err) => {
                warn!(code = err.code(), "规则编译失败: {}", err);
                return Err(err);
            }
        };

        self.entries.insert(text.to_string(), Arc::clone(&compiled));
        debug!(
            fields = compiled.required_fields.len(),
            version = compiled.compile_version,
            "规则已编译并缓存"
        );

        Ok((compiled, false))
    }

    /// 清空缓存（执行上下文销毁时调用）
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(entries = self.entries.len(), "清空规则缓存");
        }
        self.entries.clear();
    }

    /// 获取缓存统计
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    /// 获取所有已缓存的规则文本
    pub fn list_texts(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        texts.sort_unstable();
        texts
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new()
    }
}
