//! 规则编译器
//!
//! 将规则文本经词法、语法分析编译成内存中的表达式树，并预提取规则引用的属性。

use crate::error::Result;
use crate::lexer::tokenize;
use crate::models::RuleNode;
use crate::parser::{ParseOptions, Parser};
use std::collections::BTreeSet;
use std::time::Instant;

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则文本（即缓存键）
    pub text: String,
    /// 表达式树根节点
    pub root: RuleNode,
    /// 规则引用的所有属性路径
    pub required_fields: BTreeSet<String>,
    /// 编译序号
    pub compile_version: u64,
    pub compiled_at: Instant,
}

impl CompiledRule {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &RuleNode {
        &self.root
    }

    /// 规则引用的顶层属性名
    pub fn required_roots(&self) -> BTreeSet<&str> {
        let mut roots = BTreeSet::new();
        self.root.visit_paths(&mut |path| {
            roots.insert(path.root());
        });
        roots
    }
}

/// 规则编译器
pub struct RuleCompiler {
    options: ParseOptions,
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            compile_version: 0,
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// 编译规则文本
    pub fn compile(&mut self, text: &str) -> Result<CompiledRule> {
        let tokens = tokenize(text)?;
        let root = Parser::new(text, tokens, self.options).parse_rule()?;

        let required_fields = self.extract_fields(&root);

        self.compile_version += 1;

        Ok(CompiledRule {
            text: text.to_string(),
            root,
            required_fields,
            compile_version: self.compile_version,
            compiled_at: Instant::now(),
        })
    }

    fn extract_fields(&self, root: &RuleNode) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        root.visit_paths(&mut |path| {
            fields.insert(path.as_str().to_string());
        });
        fields
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}
