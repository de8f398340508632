/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`；未设置时 `verbose` 为 true 则输出 debug 级别。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n版本生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(versions_per_test: u32, max_concurrent_trials: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 试卷版本生成模式");
    info!("📊 每个测试生成版本数: {}", versions_per_test);
    info!("📊 最大并发打乱数: {}", max_concurrent_trials);
    info!("{}", "=".repeat(60));
}

/// 记录题库加载信息
pub fn log_banks_loaded(total: usize) {
    info!("✓ 找到 {} 个待处理的题库", total);
}

/// 记录批次开始信息
///
/// # 参数
/// - `test_id`: 测试 ID
/// - `title`: 测试标题
/// - `version_count`: 请求的版本数
/// - `question_count`: 题库题目数
pub fn log_batch_start(test_id: i64, title: &str, version_count: u32, question_count: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始为测试 {} ({}) 生成 {} 个版本", test_id, title, version_count);
    info!("📄 题库题目数: {}", question_count);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(test_id: i64, generated: usize, requested: u32) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 测试 {} 完成: 生成 {}/{} 个版本", test_id, generated, requested);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `tests`: 处理的测试数
/// - `failed_tests`: 处理失败的测试数
/// - `generated`: 生成的版本数
/// - `skipped`: 跳过的试验数
/// - `warnings`: 答案键告警数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    tests: usize,
    failed_tests: usize,
    generated: usize,
    skipped: usize,
    warnings: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📚 测试: {} (失败 {})", tests, failed_tests);
    info!("✅ 生成版本: {}", generated);
    info!("❌ 跳过试验: {}", skipped);
    info!("⚠️ 答案键告警: {}", warnings);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("光合作用发生在叶绿体中", 4), "光合作用...");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        init_log_file(path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("版本生成日志"));
    }
}
