//! 元组规则引擎命令行入口
//!
//! 加载配置和日志后，针对 JSON 记录执行规则评估、属性解析、记录比较等命令。

use anyhow::Result;
use clap::Parser;
use rule_engine::RuleEngine;
use rule_engine::cli::{Cli, CommandRunner, Commands};
use rule_shared::config::AppConfig;
use rule_shared::observability;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 统一加载配置：config/{service_name}.toml 与 RULES_ 环境变量
    let mut config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    if config.service_name.is_empty() {
        config.service_name = "rule-engine".to_string();
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    let _guard = observability::init(&config.service_name, &config.observability)?;

    let engine = RuleEngine::from_config(&config.engine)?;
    info!(options = ?engine.options(), "Rule engine initialized");

    let mut runner = CommandRunner::new(engine);
    let output = match cli.command {
        Commands::Eval {
            rules,
            record,
            trace,
        } => runner.run_eval(&rules, &record, trace)?,
        Commands::Resolve { path, record } => runner.run_resolve(&path, &record)?,
        Commands::Compare { left, right } => runner.run_compare(&left, &right)?,
        Commands::Schema { record } => runner.run_schema(&record)?,
        Commands::Explain { rule } => runner.run_explain(&rule)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
