//! 结果写入服务 - 业务能力层
//!
//! 只负责把批改结果落盘：每张答题卡一个 JSON 报告，外加一行运行日志。

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::grade::SheetReport;

/// 结果写入服务
///
/// 职责：
/// - 写出单张答题卡的 JSON 报告
/// - 向运行日志追加一行
/// - 不关心流程顺序
#[derive(Debug, Clone)]
pub struct ResultWriter {
    result_folder: PathBuf,
    log_file_path: PathBuf,
}

impl ResultWriter {
    pub fn new(result_folder: impl Into<PathBuf>, log_file_path: impl Into<PathBuf>) -> Self {
        Self {
            result_folder: result_folder.into(),
            log_file_path: log_file_path.into(),
        }
    }

    pub fn result_folder(&self) -> &Path {
        &self.result_folder
    }

    /// 写出 JSON 报告，返回报告路径
    ///
    /// 文件名为答题卡文件名加 `.json`，如 `aluno_01.jpg.json`。
    pub async fn write_report(&self, report: &SheetReport) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.result_folder)
            .await
            .map_err(|e| AppError::file_write_failed(self.result_folder.display().to_string(), e))?;

        let path = self.result_folder.join(format!("{}.json", report.sheet));
        let content = serde_json::to_string_pretty(report)?;

        debug!("写入报告: {} ({} 字节)", path.display(), content.len());

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        Ok(path)
    }

    /// 向运行日志追加成功记录
    pub async fn append_success(&self, report: &SheetReport) -> AppResult<()> {
        let earned = match (report.grade.earned_points, report.grade.total_points) {
            (Some(earned), Some(total)) => format!(" | 得分 {}/{}", earned, total),
            _ => String::new(),
        };
        let line = format!(
            "✓ {} | 模板 {} | 正确 {}/{} | {}{}\n",
            report.sheet,
            report.template_name,
            report.grade.correct_answers,
            report.grade.total_questions,
            report.grade.score_text(),
            earned
        );
        self.append_line(&line).await
    }

    /// 向运行日志追加失败记录
    pub async fn append_failure(&self, sheet: &str, reason: &str) -> AppResult<()> {
        let line = format!("✗ {} | {}\n", sheet, reason);
        self.append_line(&line).await
    }

    async fn append_line(&self, line: &str) -> AppResult<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .map_err(|e| AppError::file_write_failed(self.log_file_path.display().to_string(), e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(self.log_file_path.display().to_string(), e))?;

        Ok(())
    }
}
