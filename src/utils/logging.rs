use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`。
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
/// - `template_name`: 本次使用的模板名称
pub fn init_log_file(log_file_path: &str, template_name: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答题卡批改日志 - {}\n模板: {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        template_name,
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize, model_name: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题卡批量批改模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("🤖 识别模型: {}", model_name);
    info!("{}", "=".repeat(60));
}

/// 记录答题卡加载信息
pub fn log_sheets_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 张待批改的答题卡", total);
    info!("📋 将以每批 {} 张的方式处理", max_concurrent);
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始答题卡编号
/// - `end`: 结束答题卡编号
/// - `total`: 答题卡总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批答题卡: {}-{} / 共 {} 张", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `average_score`: 成功批改的答题卡平均分，没有成功时为 `None`
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    success: usize,
    failed: usize,
    total: usize,
    average_score: Option<f64>,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部批改完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    if let Some(average) = average_score {
        info!("📈 平均得分: {:.1}%", average);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
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
        assert_eq!(truncate_text("A,B,C", 10), "A,B,C");
        assert_eq!(truncate_text("A,B,C,D,E", 3), "A,B...");
        assert_eq!(truncate_text("ção", 2), "çã...");
    }

    #[test]
    fn test_init_log_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        init_log_file(path.to_str().unwrap(), "Biologia").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("答题卡批改日志"));
        assert!(content.contains("模板: Biologia"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
