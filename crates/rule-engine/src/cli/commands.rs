//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。
//! 记录参数接受内联 JSON 对象，或以 `@` 开头的 JSON 文件路径。

use clap::{Parser, Subcommand};

/// 元组规则引擎命令行工具
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "针对 JSON 记录评估规则表达式")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 评估规则
    ///
    /// 可以多次指定 `--rule`，同一执行上下文中重复的规则文本会命中缓存。
    Eval {
        /// 规则文本
        #[arg(short, long = "rule", required = true)]
        rules: Vec<String>,

        /// 记录（JSON 对象或 @文件路径）
        #[arg(short = 'd', long)]
        record: String,

        /// 输出评估追踪
        #[arg(short, long)]
        trace: bool,
    },

    /// 解析属性路径并输出值
    Resolve {
        /// 属性路径，如 `a.transport.plane.airliner`、`k[0].n`
        #[arg(short, long)]
        path: String,

        /// 记录（JSON 对象或 @文件路径）
        #[arg(short = 'd', long)]
        record: String,
    },

    /// 比较两条记录
    Compare {
        /// 第一条记录
        #[arg(long)]
        left: String,

        /// 第二条记录
        #[arg(long)]
        right: String,
    },

    /// 输出记录的 schema
    Schema {
        /// 记录（JSON 对象或 @文件路径）
        #[arg(short = 'd', long)]
        record: String,
    },

    /// 编译规则并输出表达式树
    Explain {
        /// 规则文本
        #[arg(short, long)]
        rule: String,
    },
}
