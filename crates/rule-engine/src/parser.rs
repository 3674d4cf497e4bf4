//! 语法分析
//!
//! 递归下降解析。`&&` 与 `||` 没有优先级：同一括号层级内的连接符必须一致，
//! 混用即报错，需要用括号显式分组。算术运算只能作为比较或谓词的操作数，
//! `* / %` 优先于 `+ -`，均为左结合。

use crate::error::{ParseErrorKind, Result, RuleError};
use crate::lexer::{Token, TokenKind};
use crate::models::{
    Argument, Comparison, Literal, LogicalGroup, RuleNode, SpecialPredicate, ValueExpr,
};
use crate::operators::{LogicalOperator, VerbFamily};
use crate::path::AttributePath;

/// 解析选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// 括号最大嵌套层数，None 表示不限制
    pub max_depth: Option<usize>,
}

pub struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    options: ParseOptions,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, tokens: Vec<Token>, options: ParseOptions) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
            options,
        }
    }

    /// 解析完整规则，要求消费全部记号
    pub fn parse_rule(mut self) -> Result<RuleNode> {
        if matches!(self.peek().kind, TokenKind::Eof) {
            return Err(self.error(ParseErrorKind::EmptySubexpression, 0));
        }

        let root = self.parse_group()?;

        let token = self.peek();
        match &token.kind {
            TokenKind::Eof => Ok(root),
            TokenKind::RParen => Err(self.error(ParseErrorKind::UnbalancedParenthesis, token.offset)),
            other => Err(self.error(
                ParseErrorKind::UnexpectedToken(other.to_string()),
                token.offset,
            )),
        }
    }

    /// 解析同一层级中由相同连接符连接的若干项
    fn parse_group(&mut self) -> Result<RuleNode> {
        let mut children = vec![self.parse_term()?];
        let mut connective: Option<LogicalOperator> = None;

        while let TokenKind::Logic(op) = self.peek().kind {
            let offset = self.peek().offset;
            match connective {
                None => connective = Some(op),
                Some(expected) if expected != op => {
                    return Err(self.error(
                        ParseErrorKind::MixedLogicalOperators {
                            expected: expected.symbol().to_string(),
                            found: op.symbol().to_string(),
                        },
                        offset,
                    ));
                }
                Some(_) => {}
            }
            self.advance();
            children.push(self.parse_term()?);
        }

        Ok(match connective {
            Some(op) => RuleNode::Group(LogicalGroup::new(op, children)),
            // 单个子节点直接折叠
            None => children.remove(0),
        })
    }

    fn parse_term(&mut self) -> Result<RuleNode> {
        let token = self.peek().clone();
        if token.kind != TokenKind::LParen || self.paren_starts_operand() {
            return self.parse_predicate();
        }

        self.advance();
        self.enter(token.offset)?;

        if matches!(self.peek().kind, TokenKind::RParen) {
            return Err(self.error(ParseErrorKind::EmptySubexpression, token.offset));
        }
        let node = self.parse_group()?;
        self.expect_close(token.offset)?;

        self.depth -= 1;
        Ok(node)
    }

    /// 判断当前 `(` 是否开启一个算术操作数：其配对的 `)` 后紧跟算术、关系操作符或谓词
    fn paren_starts_operand(&self) -> bool {
        let mut level = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            match token.kind {
                TokenKind::LParen => level += 1,
                TokenKind::RParen => {
                    level -= 1;
                    if level == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Arith(_) | TokenKind::Rel(_) | TokenKind::Verb(_))
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    fn parse_predicate(&mut self) -> Result<RuleNode> {
        let subject = self.parse_arith()?;
        let token = self.advance();

        match token.kind {
            TokenKind::Rel(operator) => {
                let right = self.parse_arith()?;
                Ok(RuleNode::Comparison(Comparison::new(subject, operator, right)))
            }
            TokenKind::Verb(verb) => {
                let argument = if matches!(self.peek().kind, TokenKind::LBracket) {
                    if verb.family() != VerbFamily::In {
                        let offset = self.peek().offset;
                        return Err(self.error(
                            ParseErrorKind::UnexpectedToken("'['".to_string()),
                            offset,
                        ));
                    }
                    Argument::List(self.parse_list_literal()?)
                } else {
                    Argument::Expr(self.parse_arith()?)
                };
                Ok(RuleNode::Special(SpecialPredicate::new(subject, verb, argument)))
            }
            // 路径位置出现的未知单词，如 `a equals 'x'`
            TokenKind::Path(word) => Err(self.error(
                ParseErrorKind::UnknownOperator(word),
                token.offset,
            )),
            TokenKind::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd, token.offset)),
            other => Err(self.error(
                ParseErrorKind::UnexpectedToken(other.to_string()),
                token.offset,
            )),
        }
    }

    /// 解析 `[lit, lit, ...]`，仅允许字面量
    fn parse_list_literal(&mut self) -> Result<Vec<Literal>> {
        let open = self.advance();
        let mut items = Vec::new();

        if matches!(self.peek().kind, TokenKind::RBracket) {
            self.advance();
            return Ok(items);
        }

        loop {
            let token = self.advance();
            let item = match token.kind {
                TokenKind::Str(s) => Literal::Str(s),
                TokenKind::Int(i) => Literal::Int(i),
                TokenKind::Float(f) => Literal::Float(f),
                TokenKind::Bool(b) => Literal::Bool(b),
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::UnexpectedEnd, token.offset));
                }
                other => {
                    return Err(self.error(
                        ParseErrorKind::MalformedLiteral(other.to_string()),
                        token.offset,
                    ));
                }
            };
            items.push(item);

            let token = self.advance();
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RBracket => return Ok(items),
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::UnexpectedEnd, open.offset));
                }
                other => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken(other.to_string()),
                        token.offset,
                    ));
                }
            }
        }
    }

    /// 加减
    fn parse_arith(&mut self) -> Result<ValueExpr> {
        let mut left = self.parse_mul()?;
        while let TokenKind::Arith(op) = self.peek().kind {
            if op.is_multiplicative() {
                break;
            }
            self.advance();
            let right = self.parse_mul()?;
            left = ValueExpr::arithmetic(left, op, right);
        }
        Ok(left)
    }

    /// 乘除取模
    fn parse_mul(&mut self) -> Result<ValueExpr> {
        let mut left = self.parse_operand()?;
        while let TokenKind::Arith(op) = self.peek().kind {
            if !op.is_multiplicative() {
                break;
            }
            self.advance();
            let right = self.parse_operand()?;
            left = ValueExpr::arithmetic(left, op, right);
        }
        Ok(left)
    }

    fn parse_operand(&mut self) -> Result<ValueExpr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Path(text) => {
                let path = AttributePath::parse_at(&text, token.offset, self.source)?;
                Ok(ValueExpr::path(path))
            }
            TokenKind::Str(s) => Ok(Literal::Str(s).into()),
            TokenKind::Int(i) => Ok(Literal::Int(i).into()),
            TokenKind::Float(f) => Ok(Literal::Float(f).into()),
            TokenKind::Bool(b) => Ok(Literal::Bool(b).into()),
            TokenKind::LParen => {
                self.enter(token.offset)?;
                if matches!(self.peek().kind, TokenKind::RParen) {
                    return Err(self.error(ParseErrorKind::EmptySubexpression, token.offset));
                }
                let expr = self.parse_arith()?;
                self.expect_close(token.offset)?;
                self.depth -= 1;
                Ok(expr)
            }
            TokenKind::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd, token.offset)),
            other => Err(self.error(
                ParseErrorKind::UnexpectedToken(other.to_string()),
                token.offset,
            )),
        }
    }

    fn expect_close(&mut self, open_offset: usize) -> Result<()> {
        let token = self.advance();
        match token.kind {
            TokenKind::RParen => Ok(()),
            TokenKind::Eof => Err(self.error(ParseErrorKind::UnbalancedParenthesis, open_offset)),
            other => Err(self.error(
                ParseErrorKind::UnexpectedToken(other.to_string()),
                token.offset,
            )),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<()> {
        self.depth += 1;
        match self.options.max_depth {
            Some(max) if self.depth > max => {
                Err(self.error(ParseErrorKind::NestingTooDeep(max), offset))
            }
            _ => Ok(()),
        }
    }

    fn peek(&self) -> &Token {
        // 记号序列总以 Eof 结尾
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> RuleError {
        RuleError::parse(kind, offset, self.source)
    }
}

/// 便捷函数：词法分析并解析规则文本
pub fn parse(source: &str, options: ParseOptions) -> Result<RuleNode> {
    let tokens = crate::lexer::tokenize(source)?;
    Parser::new(source, tokens, options).parse_rule()
}
