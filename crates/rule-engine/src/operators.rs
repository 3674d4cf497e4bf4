//! 规则操作符定义

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// 关系操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationalOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelationalOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// 根据比较结果判断关系是否成立
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }

    /// 是否只比较相等性
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 算术操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithmeticOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// 乘除模优先于加减
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Self::Mul | Self::Div | Self::Rem)
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 谓词动词的语义族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbFamily {
    Contains,
    StartsWith,
    EndsWith,
    In,
    Equals,
    Size(RelationalOperator),
}

/// 特殊谓词动词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpecialVerb {
    // 字符串操作
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notContains")]
    NotContains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "notStartsWith")]
    NotStartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "notEndsWith")]
    NotEndsWith,

    // 包含检查
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notIn")]
    NotIn,

    // 忽略大小写
    #[serde(rename = "containsCI")]
    ContainsCI,
    #[serde(rename = "notContainsCI")]
    NotContainsCI,
    #[serde(rename = "startsWithCI")]
    StartsWithCI,
    #[serde(rename = "notStartsWithCI")]
    NotStartsWithCI,
    #[serde(rename = "endsWithCI")]
    EndsWithCI,
    #[serde(rename = "notEndsWithCI")]
    NotEndsWithCI,
    #[serde(rename = "inCI")]
    InCI,
    #[serde(rename = "notInCI")]
    NotInCI,
    #[serde(rename = "equalsCI")]
    EqualsCI,
    #[serde(rename = "notEqualsCI")]
    NotEqualsCI,

    // 集合大小
    #[serde(rename = "sizeEQ")]
    SizeEQ,
    #[serde(rename = "sizeNE")]
    SizeNE,
    #[serde(rename = "sizeLT")]
    SizeLT,
    #[serde(rename = "sizeLE")]
    SizeLE,
    #[serde(rename = "sizeGT")]
    SizeGT,
    #[serde(rename = "sizeGE")]
    SizeGE,
}

impl SpecialVerb {
    pub const ALL: [SpecialVerb; 24] = [
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::NotStartsWith,
        Self::EndsWith,
        Self::NotEndsWith,
        Self::In,
        Self::NotIn,
        Self::ContainsCI,
        Self::NotContainsCI,
        Self::StartsWithCI,
        Self::NotStartsWithCI,
        Self::EndsWithCI,
        Self::NotEndsWithCI,
        Self::InCI,
        Self::NotInCI,
        Self::EqualsCI,
        Self::NotEqualsCI,
        Self::SizeEQ,
        Self::SizeNE,
        Self::SizeLT,
        Self::SizeLE,
        Self::SizeGT,
        Self::SizeGE,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::NotStartsWith => "notStartsWith",
            Self::EndsWith => "endsWith",
            Self::NotEndsWith => "notEndsWith",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::ContainsCI => "containsCI",
            Self::NotContainsCI => "notContainsCI",
            Self::StartsWithCI => "startsWithCI",
            Self::NotStartsWithCI => "notStartsWithCI",
            Self::EndsWithCI => "endsWithCI",
            Self::NotEndsWithCI => "notEndsWithCI",
            Self::InCI => "inCI",
            Self::NotInCI => "notInCI",
            Self::EqualsCI => "equalsCI",
            Self::NotEqualsCI => "notEqualsCI",
            Self::SizeEQ => "sizeEQ",
            Self::SizeNE => "sizeNE",
            Self::SizeLT => "sizeLT",
            Self::SizeLE => "sizeLE",
            Self::SizeGT => "sizeGT",
            Self::SizeGE => "sizeGE",
        }
    }

    /// 关键字区分大小写
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|verb| verb.keyword() == word)
    }

    pub fn family(self) -> VerbFamily {
        match self {
            Self::Contains | Self::NotContains | Self::ContainsCI | Self::NotContainsCI => {
                VerbFamily::Contains
            }
            Self::StartsWith | Self::NotStartsWith | Self::StartsWithCI | Self::NotStartsWithCI => {
                VerbFamily::StartsWith
            }
            Self::EndsWith | Self::NotEndsWith | Self::EndsWithCI | Self::NotEndsWithCI => {
                VerbFamily::EndsWith
            }
            Self::In | Self::NotIn | Self::InCI | Self::NotInCI => VerbFamily::In,
            Self::EqualsCI | Self::NotEqualsCI => VerbFamily::Equals,
            Self::SizeEQ => VerbFamily::Size(RelationalOperator::Eq),
            Self::SizeNE => VerbFamily::Size(RelationalOperator::Ne),
            Self::SizeLT => VerbFamily::Size(RelationalOperator::Lt),
            Self::SizeLE => VerbFamily::Size(RelationalOperator::Le),
            Self::SizeGT => VerbFamily::Size(RelationalOperator::Gt),
            Self::SizeGE => VerbFamily::Size(RelationalOperator::Ge),
        }
    }

    pub fn is_case_insensitive(self) -> bool {
        self.keyword().ends_with("CI")
    }

    pub fn is_negated(self) -> bool {
        self.keyword().starts_with("not")
    }
}

impl fmt::Display for SpecialVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_roundtrip() {
        for verb in SpecialVerb::ALL {
            assert_eq!(SpecialVerb::from_keyword(verb.keyword()), Some(verb));
        }
        assert_eq!(SpecialVerb::from_keyword("CONTAINS"), None);
        assert_eq!(SpecialVerb::from_keyword("size"), None);
    }

    #[test]
    fn test_verb_flags() {
        assert!(SpecialVerb::NotStartsWithCI.is_negated());
        assert!(SpecialVerb::NotStartsWithCI.is_case_insensitive());
        assert!(!SpecialVerb::SizeNE.is_negated());
        assert!(!SpecialVerb::SizeNE.is_case_insensitive());
        assert_eq!(
            SpecialVerb::SizeLE.family(),
            VerbFamily::Size(RelationalOperator::Le)
        );
    }

    #[test]
    fn test_relational_holds() {
        assert!(RelationalOperator::Le.holds(Ordering::Equal));
        assert!(RelationalOperator::Le.holds(Ordering::Less));
        assert!(!RelationalOperator::Gt.holds(Ordering::Equal));
        assert!(RelationalOperator::Ne.holds(Ordering::Greater));
    }

    #[test]
    fn test_display() {
        assert_eq!(LogicalOperator::And.to_string(), "AND");
        assert_eq!(LogicalOperator::Or.symbol(), "||");
        assert_eq!(ArithmeticOperator::Rem.to_string(), "%");
        assert_eq!(SpecialVerb::EqualsCI.to_string(), "equalsCI");
    }
}
