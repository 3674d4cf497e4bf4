//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `eval` - 针对记录评估一条或多条规则
//! - `resolve` - 解析属性路径
//! - `compare` - 比较两条记录
//! - `schema` - 输出记录 schema
//! - `explain` - 输出规则编译后的表达式树
//!
//! # 使用示例
//!
//! ```bash
//! rule-engine eval -r "symbol == 'INTC' && price > 698.56" -d '{"symbol": "INTC", "price": 79.25}'
//! rule-engine resolve -p employee.skills -d @record.json
//! rule-engine compare --left @a.json --right @b.json
//! rule-engine explain -r "(a == 1 || b == 2) && c == 3"
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
