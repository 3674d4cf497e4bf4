//! 规则表达式树

use crate::error::{RuleError, SUCCESS};
use crate::operators::{ArithmeticOperator, LogicalOperator, RelationalOperator, SpecialVerb};
use crate::path::AttributePath;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// 规则节点（比较、特殊谓词或逻辑组）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Comparison(Comparison),
    Special(SpecialPredicate),
    Group(LogicalGroup),
}

impl RuleNode {
    /// 树中叶子节点（比较与谓词）的数量
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Group(group) => group.children.iter().map(RuleNode::leaf_count).sum(),
            _ => 1,
        }
    }

    /// 逻辑组的最大嵌套深度，叶子为 0
    pub fn depth(&self) -> usize {
        match self {
            Self::Group(group) => {
                1 + group
                    .children
                    .iter()
                    .map(RuleNode::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// 按出现顺序访问所有属性路径
    pub fn visit_paths<'t>(&'t self, visit: &mut impl FnMut(&'t AttributePath)) {
        match self {
            Self::Comparison(cmp) => {
                cmp.left.visit_paths(visit);
                cmp.right.visit_paths(visit);
            }
            Self::Special(special) => {
                special.subject.visit_paths(visit);
                if let Argument::Expr(expr) = &special.argument {
                    expr.visit_paths(visit);
                }
            }
            Self::Group(group) => {
                for child in &group.children {
                    child.visit_paths(visit);
                }
            }
        }
    }
}

/// 关系比较节点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub left: ValueExpr,
    pub operator: RelationalOperator,
    pub right: ValueExpr,
}

impl Comparison {
    pub fn new(left: ValueExpr, operator: RelationalOperator, right: ValueExpr) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }
}

/// 特殊谓词节点，如 `b contains 'xyz'`、`tags sizeGE 2`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialPredicate {
    pub subject: ValueExpr,
    pub verb: SpecialVerb,
    pub argument: Argument,
}

impl SpecialPredicate {
    pub fn new(subject: ValueExpr, verb: SpecialVerb, argument: Argument) -> Self {
        Self {
            subject,
            verb,
            argument,
        }
    }
}

/// 逻辑组节点，同一层级的子节点使用同一个连接符
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalGroup {
    pub operator: LogicalOperator,
    pub children: Vec<RuleNode>,
}

impl LogicalGroup {
    pub fn new(operator: LogicalOperator, children: Vec<RuleNode>) -> Self {
        Self { operator, children }
    }

    pub fn and(children: Vec<RuleNode>) -> Self {
        Self::new(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<RuleNode>) -> Self {
        Self::new(LogicalOperator::Or, children)
    }
}

/// 操作数表达式
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    Path(AttributePath),
    Literal(Literal),
    Arithmetic(Box<ArithmeticExpr>),
}

impl ValueExpr {
    pub fn path(path: AttributePath) -> Self {
        Self::Path(path)
    }

    pub fn arithmetic(left: ValueExpr, operator: ArithmeticOperator, right: ValueExpr) -> Self {
        Self::Arithmetic(Box::new(ArithmeticExpr {
            left,
            operator,
            right,
        }))
    }

    pub fn visit_paths<'t>(&'t self, visit: &mut impl FnMut(&'t AttributePath)) {
        match self {
            Self::Path(path) => visit(path),
            Self::Literal(_) => {}
            Self::Arithmetic(expr) => {
                expr.left.visit_paths(visit);
                expr.right.visit_paths(visit);
            }
        }
    }
}

impl From<Literal> for ValueExpr {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArithmeticExpr {
    pub left: ValueExpr,
    pub operator: ArithmeticOperator,
    pub right: ValueExpr,
}

/// 字面量
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    /// 以借用方式转换为运行时值
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Self::Str(s) => Value::str(s),
            Self::Int(i) => Value::Int(*i),
            Self::Float(f) => Value::Float(*f),
            Self::Bool(b) => Value::Bool(*b),
        }
    }
}

/// 特殊谓词的参数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    Expr(ValueExpr),
    List(Vec<Literal>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => {
                // 只输出词法分析器认识的转义，其他字符原样写出
                write!(f, "\"")?;
                for c in s.chars() {
                    if matches!(c, '"' | '\\') {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path),
            Self::Literal(literal) => write!(f, "{}", literal),
            Self::Arithmetic(expr) => {
                write!(f, "({} {} {})", expr.left, expr.operator, expr.right)
            }
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(expr) => write!(f, "{}", expr),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(cmp) => write!(f, "{} {} {}", cmp.left, cmp.operator, cmp.right),
            Self::Special(special) => {
                write!(f, "{} {} {}", special.subject, special.verb, special.argument)
            }
            Self::Group(group) => {
                write!(f, "(")?;
                for (i, child) in group.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", group.operator.symbol())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// 评估结果
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub matched: bool,
    pub error: Option<RuleError>,
    pub cache_hit: bool,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

impl EvaluationResult {
    pub fn new() -> Self {
        Self {
            matched: false,
            error: None,
            cache_hit: false,
            evaluation_trace: Vec::new(),
            evaluation_time_us: 0,
        }
    }

    /// 错误码，0 表示成功；仅在成功时 `matched` 有意义
    pub fn error_code(&self) -> i32 {
        self.error.as_ref().map(RuleError::code).unwrap_or(SUCCESS)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<bool, RuleError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.matched),
        }
    }
}

impl Default for EvaluationResult {
    fn default() -> Self {
        Self::new()
    }
}
