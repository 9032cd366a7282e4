/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{AppResult, FileError};
use crate::models::{BatchOutcome, BatchSummary};

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n预订文档下载日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|source| FileError::WriteFailed {
        path: log_file_path.to_string(),
        source,
    })?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(output_dir: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 预订文档批量下载");
    info!("📁 输出目录: {}", output_dir);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, domain: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理批次: {} 个预订 ({})", total, domain);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(summary: &BatchSummary) {
    info!("\n{}", "─".repeat(60));
    match summary.outcome {
        BatchOutcome::Completed => info!("✓ 批次完成"),
        BatchOutcome::Cancelled => info!("⏹ 批次已取消"),
        BatchOutcome::OutOfCredits => info!("⚠️ 批次因额度用完而停止"),
    }
    info!(
        "成功 {}/{}，失败 {}",
        summary.succeeded, summary.total, summary.failed
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息，并追加到日志文件
pub fn print_final_stats(summary: &BatchSummary, log_file_path: &str) -> AppResult<()> {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.succeeded, summary.total);
    info!("❌ 失败: {}", summary.failed);
    for line in &summary.errors {
        info!("   {}", line);
    }
    if let Some(reason) = &summary.stop_reason {
        info!("⚠️ {}", reason);
    }
    info!("{}", "=".repeat(60));

    let mut report = String::new();
    for result in &summary.results {
        if result.success {
            report.push_str(&format!("✓ {} | {}\n", result.code, result.files.join(", ")));
        } else if let Some(line) = result.error_line() {
            report.push_str(&format!("✗ {}\n", line));
        }
    }
    if let Some(reason) = &summary.stop_reason {
        report.push_str(&format!("! {}\n", reason));
    }

    let mut content = fs::read_to_string(log_file_path).unwrap_or_default();
    content.push_str(&report);
    fs::write(log_file_path, content).map_err(|source| FileError::WriteFailed {
        path: log_file_path.to_string(),
        source,
    })?;

    info!("\n日志已保存至: {}", log_file_path);
    Ok(())
}
