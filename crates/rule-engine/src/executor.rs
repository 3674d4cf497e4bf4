//! 规则执行器
//!
//! 对编译后的表达式树做短路求值，遇到属性路径时调用解析器取值。
//! 任何子节点出错都会终止整个评估。

use crate::compiler::CompiledRule;
use crate::error::Result;
use crate::evaluator::ConditionEvaluator;
use crate::models::{
    Argument, Comparison, EvaluationResult, Literal, LogicalGroup, RuleNode, SpecialPredicate,
    ValueExpr,
};
use crate::operators::LogicalOperator;
use crate::record::Record;
use crate::resolver::resolve;
use crate::value::{StringOrdering, Value};
use std::time::Instant;
use tracing::debug;

/// 规则执行器
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
    evaluator: ConditionEvaluator,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn with_string_ordering(mut self, ordering: StringOrdering) -> Self {
        self.evaluator = ConditionEvaluator::new(ordering);
        self
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    /// 执行规则评估，错误记录在结果中
    pub fn execute(&self, rule: &CompiledRule, record: &dyn Record) -> EvaluationResult {
        let start = Instant::now();
        let mut result = EvaluationResult::new();

        match self.evaluate_node(rule.root(), record, &mut result.evaluation_trace, "root") {
            Ok(matched) => result.matched = matched,
            Err(err) => result.error = Some(err),
        }

        result.evaluation_time_us = start.elapsed().as_micros() as u64;
        result
    }

    /// 执行规则评估，返回匹配结果
    pub fn evaluate(&self, rule: &CompiledRule, record: &dyn Record) -> Result<bool> {
        let mut trace = Vec::new();
        self.evaluate_node(rule.root(), record, &mut trace, "root")
    }

    fn evaluate_node(
        &self,
        node: &RuleNode,
        record: &dyn Record,
        trace: &mut Vec<String>,
        path: &str,
    ) -> Result<bool> {
        match node {
            RuleNode::Group(group) => self.evaluate_group(group, record, trace, path),
            RuleNode::Comparison(cmp) => {
                let outcome = self.evaluate_comparison(cmp, record);
                self.trace_leaf(trace, path, node, &outcome);
                outcome
            }
            RuleNode::Special(special) => {
                let outcome = self.evaluate_special(special, record);
                self.trace_leaf(trace, path, node, &outcome);
                outcome
            }
        }
    }

    fn evaluate_comparison(&self, cmp: &Comparison, record: &dyn Record) -> Result<bool> {
        let left = self.evaluate_expr(&cmp.left, record)?;
        let right = self.evaluate_expr(&cmp.right, record)?;
        self.evaluator.compare(&left, cmp.operator, &right)
    }

    fn evaluate_special(&self, special: &SpecialPredicate, record: &dyn Record) -> Result<bool> {
        let subject = self.evaluate_expr(&special.subject, record)?;
        let argument = match &special.argument {
            Argument::Expr(expr) => self.evaluate_expr(expr, record)?,
            // 字面量列表在每次评估时物化
            Argument::List(items) => Value::List(items.iter().map(Literal::as_value).collect()),
        };
        self.evaluator.apply_verb(&subject, special.verb, &argument)
    }

    fn trace_leaf(&self, trace: &mut Vec<String>, path: &str, node: &RuleNode, outcome: &Result<bool>) {
        if !self.trace_enabled {
            return;
        }
        let line = match outcome {
            Ok(true) => format!("{}: {} => MATCHED", path, node),
            Ok(false) => format!("{}: {} => NOT_MATCHED", path, node),
            Err(err) => format!("{}: {} => ERROR {} ({})", path, node, err.code(), err),
        };
        self.record_trace(trace, line);
    }

    /// 计算操作数
    fn evaluate_expr<'a>(&self, expr: &'a ValueExpr, record: &'a dyn Record) -> Result<Value<'a>> {
        match expr {
            ValueExpr::Path(path) => resolve(record, path),
            ValueExpr::Literal(literal) => Ok(literal.as_value()),
            ValueExpr::Arithmetic(arith) => {
                let left = self.evaluate_expr(&arith.left, record)?;
                let right = self.evaluate_expr(&arith.right, record)?;
                self.evaluator.arithmetic(&left, arith.operator, &right)
            }
        }
    }

    /// 评估逻辑组节点（短路求值）
    fn evaluate_group(
        &self,
        group: &LogicalGroup,
        record: &dyn Record,
        trace: &mut Vec<String>,
        path: &str,
    ) -> Result<bool> {
        if self.trace_enabled {
            self.record_trace(
                trace,
                format!(
                    "{}: 开始评估 {} 组 (共 {} 个子节点)",
                    path,
                    group.operator,
                    group.children.len()
                ),
            );
        }

        // AND 遇到 false 立即返回，OR 遇到 true 立即返回
        let short_circuit_on = group.operator == LogicalOperator::Or;

        for (i, child) in group.children.iter().enumerate() {
            let child_path = format!("{}.children[{}]", path, i);
            let child_matched = self.evaluate_node(child, record, trace, &child_path)?;

            if child_matched == short_circuit_on {
                if self.trace_enabled {
                    let reason = if short_circuit_on { "匹配" } else { "不匹配" };
                    self.record_trace(
                        trace,
                        format!("{}: {} 短路 - 子节点 {} {}", path, group.operator, i, reason),
                    );
                }
                return Ok(short_circuit_on);
            }
        }

        if self.trace_enabled {
            let summary = match group.operator {
                LogicalOperator::And => "AND 组全部匹配",
                LogicalOperator::Or => "OR 组无匹配",
            };
            self.record_trace(trace, format!("{}: {}", path, summary));
        }
        Ok(!short_circuit_on)
    }

    fn record_trace(&self, trace: &mut Vec<String>, line: String) {
        debug!(target: "rule_engine::trace", "{}", line);
        trace.push(line);
    }
}
