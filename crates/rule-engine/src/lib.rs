//! 元组规则引擎
//!
//! 针对结构化记录评估人工编写的布尔规则，支持：
//! - 规则文本的词法、语法分析（同一层级逻辑连接符必须一致）
//! - 嵌套元组、集合与列表元素的属性路径解析
//! - 关系、逻辑、算术、字符串与集合操作符（含忽略大小写与 size 变体）
//! - 按规则原文缓存编译结果（每个执行上下文独立）
//! - 记录比较与 schema 描述

pub mod cache;
pub mod cli;
pub mod compare;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod models;
pub mod operators;
pub mod parser;
pub mod path;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod value;

pub use cache::{CacheStats, RuleCache};
pub use compare::RecordComparison;
pub use compiler::{CompiledRule, RuleCompiler};
pub use engine::{EngineOptions, RuleEngine};
pub use error::{Result, RuleError};
pub use models::{EvaluationResult, LogicalGroup, RuleNode};
pub use operators::{ArithmeticOperator, LogicalOperator, RelationalOperator, SpecialVerb};
pub use path::AttributePath;
pub use record::{Datum, Record, Tuple};
pub use schema::SchemaDescription;
pub use value::{StringOrdering, Value, ValueKind};
