//! 条件评估器
//!
//! 实现关系比较、特殊谓词和算术运算在运行时值上的语义。
//! 除整数到浮点数的拓宽和 CI 谓词的大小写折叠外不做任何隐式转换。

use crate::error::{Result, RuleError};
use crate::operators::{ArithmeticOperator, RelationalOperator, SpecialVerb, VerbFamily};
use crate::value::{StringOrdering, Value, ValueKind};

/// 条件评估器
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator {
    ordering: StringOrdering,
}

impl ConditionEvaluator {
    pub fn new(ordering: StringOrdering) -> Self {
        Self { ordering }
    }

    pub fn string_ordering(&self) -> StringOrdering {
        self.ordering
    }

    /// 关系比较
    pub fn compare(
        &self,
        left: &Value<'_>,
        operator: RelationalOperator,
        right: &Value<'_>,
    ) -> Result<bool> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(operator.holds(a.cmp(b))),
            (a, b) if a.kind().is_numeric() && b.kind().is_numeric() => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                match x.partial_cmp(&y) {
                    Some(ordering) => Ok(operator.holds(ordering)),
                    // NaN 与任何值都不相等
                    None => Ok(operator == RelationalOperator::Ne),
                }
            }
            // 相等性始终精确比较，排序方式只影响大小关系
            (Value::Str(a), Value::Str(b)) if operator.is_equality() => {
                Ok((a == b) == (operator == RelationalOperator::Eq))
            }
            (Value::Str(a), Value::Str(b)) => Ok(operator.holds(self.ordering.compare(a, b))),
            (a, b) if a.kind() == b.kind() => {
                // 布尔、集合与记录只支持相等性比较
                if !operator.is_equality() {
                    return Err(RuleError::InvalidOperator {
                        operator: operator.symbol().to_string(),
                        value_type: a.kind().to_string(),
                    });
                }
                let equal = a.structural_eq(b);
                Ok(if operator == RelationalOperator::Eq {
                    equal
                } else {
                    !equal
                })
            }
            (a, b) => Err(RuleError::TypeMismatch {
                operator: operator.symbol().to_string(),
                expected: a.kind().to_string(),
                actual: b.kind().to_string(),
            }),
        }
    }

    /// 特殊谓词
    pub fn apply_verb(
        &self,
        subject: &Value<'_>,
        verb: SpecialVerb,
        argument: &Value<'_>,
    ) -> Result<bool> {
        let matched = if verb.is_case_insensitive() {
            Self::apply_family(verb, &subject.fold_case(), &argument.fold_case())?
        } else {
            Self::apply_family(verb, subject, argument)?
        };

        Ok(matched != verb.is_negated())
    }

    fn apply_family(verb: SpecialVerb, subject: &Value<'_>, argument: &Value<'_>) -> Result<bool> {
        match verb.family() {
            VerbFamily::Contains => match subject {
                Value::Str(s) => Ok(s.contains(Self::expect_str(verb, argument)?)),
                Value::List(items) | Value::Set(items) => {
                    Ok(items.iter().any(|item| item.structural_eq(argument)))
                }
                Value::Map(entries) => Ok(entries.iter().any(|(k, _)| k.structural_eq(argument))),
                other => Err(Self::mismatch(verb, ValueKind::Str, other)),
            },
            VerbFamily::StartsWith => {
                let s = Self::expect_str(verb, subject)?;
                Ok(s.starts_with(Self::expect_str(verb, argument)?))
            }
            VerbFamily::EndsWith => {
                let s = Self::expect_str(verb, subject)?;
                Ok(s.ends_with(Self::expect_str(verb, argument)?))
            }
            VerbFamily::Equals => {
                let s = Self::expect_str(verb, subject)?;
                Ok(s == Self::expect_str(verb, argument)?)
            }
            VerbFamily::In => {
                let candidates = match argument {
                    Value::List(items) | Value::Set(items) => items,
                    other => return Err(Self::mismatch(verb, ValueKind::List, other)),
                };
                if subject.kind().is_collection() || subject.kind() == ValueKind::Record {
                    return Err(RuleError::InvalidOperator {
                        operator: verb.keyword().to_string(),
                        value_type: subject.kind().to_string(),
                    });
                }
                Ok(candidates.iter().any(|item| item.structural_eq(subject)))
            }
            VerbFamily::Size(relation) => {
                let size = subject
                    .cardinality()
                    .ok_or_else(|| Self::mismatch(verb, ValueKind::List, subject))?;
                let expected = match argument {
                    Value::Int(n) => *n,
                    other => return Err(Self::mismatch(verb, ValueKind::Int, other)),
                };
                let size = i64::try_from(size).unwrap_or(i64::MAX);
                Ok(relation.holds(size.cmp(&expected)))
            }
        }
    }

    /// 算术运算：整数与整数做溢出检查，其余拓宽为浮点数
    pub fn arithmetic<'v>(
        &self,
        left: &Value<'_>,
        operator: ArithmeticOperator,
        right: &Value<'_>,
    ) -> Result<Value<'v>> {
        let symbol = || operator.symbol().to_string();

        match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                let (a, b) = (*a, *b);
                if b == 0 && matches!(operator, ArithmeticOperator::Div | ArithmeticOperator::Rem) {
                    return Err(RuleError::DivisionByZero { operator: symbol() });
                }
                let result = match operator {
                    ArithmeticOperator::Add => a.checked_add(b),
                    ArithmeticOperator::Sub => a.checked_sub(b),
                    ArithmeticOperator::Mul => a.checked_mul(b),
                    ArithmeticOperator::Div => a.checked_div(b),
                    ArithmeticOperator::Rem => a.checked_rem(b),
                };
                result
                    .map(Value::Int)
                    .ok_or_else(|| RuleError::ArithmeticOverflow { operator: symbol() })
            }
            (a, b) if a.kind().is_numeric() && b.kind().is_numeric() => {
                let x = a.as_f64().unwrap_or(f64::NAN);
                let y = b.as_f64().unwrap_or(f64::NAN);
                if y == 0.0 && matches!(operator, ArithmeticOperator::Div | ArithmeticOperator::Rem)
                {
                    return Err(RuleError::DivisionByZero { operator: symbol() });
                }
                let result = match operator {
                    ArithmeticOperator::Add => x + y,
                    ArithmeticOperator::Sub => x - y,
                    ArithmeticOperator::Mul => x * y,
                    ArithmeticOperator::Div => x / y,
                    ArithmeticOperator::Rem => x % y,
                };
                if result.is_infinite() {
                    return Err(RuleError::ArithmeticOverflow { operator: symbol() });
                }
                Ok(Value::Float(result))
            }
            (a, b) if a.kind() == b.kind() => Err(RuleError::InvalidOperator {
                operator: symbol(),
                value_type: a.kind().to_string(),
            }),
            (a, b) => {
                let offending = if a.kind().is_numeric() { b } else { a };
                Err(RuleError::TypeMismatch {
                    operator: symbol(),
                    expected: "numeric".to_string(),
                    actual: offending.kind().to_string(),
                })
            }
        }
    }

    fn expect_str<'v>(verb: SpecialVerb, value: &'v Value<'_>) -> Result<&'v str> {
        value
            .as_str()
            .ok_or_else(|| Self::mismatch(verb, ValueKind::Str, value))
    }

    fn mismatch(verb: SpecialVerb, expected: ValueKind, actual: &Value<'_>) -> RuleError {
        RuleError::TypeMismatch {
            operator: verb.keyword().to_string(),
            expected: expected.to_string(),
            actual: actual.kind().to_string(),
        }
    }
}
