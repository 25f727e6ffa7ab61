//! 批量答题卡处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量答题卡的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、加载模板、选择本次使用的模板、初始化日志文件
//! 2. **批量扫描**：扫描答题卡目录中的所有图片
//! 3. **并发控制**：使用 Semaphore 限制同时调用识别服务的数量
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **全局统计**：汇总成功、失败数量和平均分

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, TemplateError};
use crate::models::loaders::load_all_template_files;
use crate::models::template::Template;
use crate::orchestrator::sheet_processor;
use crate::services::{AnswerExtractor, LlmService, MemoryStorage, ResultWriter, TemplateStore};
use crate::utils::image::is_supported_image;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_sheets_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::{GradingFlow, SheetCtx};

/// 应用主结构
pub struct App<E: AnswerExtractor + 'static> {
    config: Config,
    template: Arc<Template>,
    flow: GradingFlow<E>,
    writer: ResultWriter,
}

/// 全部答题卡的处理统计
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// 成功批改的答题卡得分
    pub scores: Vec<f64>,
}

impl ProcessingStats {
    pub fn average_score(&self) -> Option<f64> {
        if self.scores.is_empty() {
            None
        } else {
            Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
        }
    }
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
    scores: Vec<f64>,
}

impl App<LlmService> {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;

        let template = load_template(&config).await?;
        let extractor = Arc::new(LlmService::new(&config));

        log_startup(config.max_concurrent_sheets, extractor.model_name());

        Ok(Self::with_extractor(config, template, extractor)?)
    }
}

impl<E: AnswerExtractor + 'static> App<E> {
    /// 使用指定的识别服务和模板创建应用
    pub fn with_extractor(config: Config, template: Template, extractor: Arc<E>) -> Result<Self> {
        init_log_file(&config.output_log_file, &template.name)
            .with_context(|| format!("无法初始化日志文件: {}", config.output_log_file))?;

        info!(
            "📝 使用模板: {} ({} 题, 总分 {})",
            template.name,
            template.question_count(),
            template.total_points()
        );

        let flow = GradingFlow::new(extractor, config.verbose_logging);
        let writer = ResultWriter::new(&config.result_folder, &config.output_log_file);

        Ok(Self {
            config,
            template: Arc::new(template),
            flow,
            writer,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let sheets = self.load_sheets().await?;

        if sheets.is_empty() {
            warn!("⚠️ 没有找到待批改的答题卡图片，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_sheets_loaded(sheets.len(), self.config.max_concurrent_sheets);

        let stats = self.process_all_sheets(sheets).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            stats.average_score(),
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 扫描答题卡目录
    async fn load_sheets(&self) -> Result<Vec<PathBuf>> {
        info!("\n📁 正在扫描待批改的答题卡...");
        scan_sheet_folder(Path::new(&self.config.sheet_folder)).await
    }

    /// 处理所有答题卡
    async fn process_all_sheets(&self, sheets: Vec<PathBuf>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_sheets.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_sheets = sheets.len();
        let mut stats = ProcessingStats {
            total: total_sheets,
            ..Default::default()
        };

        let total_batches = total_sheets.div_ceil(batch_size);

        for (batch_idx, batch) in sheets.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            let batch_num = batch_idx + 1;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total_sheets,
            );

            let batch_result = self
                .process_batch(batch, batch_start, semaphore.clone())
                .await?;

            log_batch_complete(
                batch_num,
                batch_result.success,
                batch_result.success + batch_result.failed,
            );

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;
            stats.scores.extend(batch_result.scores);
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch: &[PathBuf],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut batch_handles = Vec::new();

        for (idx, path) in batch.iter().enumerate() {
            let sheet_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let sheet_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let ctx = SheetCtx::new(sheet_index, sheet_name, self.template.id.clone());

            let flow = self.flow.clone();
            let template = Arc::clone(&self.template);
            let writer = self.writer.clone();
            let path = path.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                sheet_processor::process_sheet(&flow, &ctx, &path, &template, &writer).await
            });
            batch_handles.push((sheet_index, handle));
        }

        let mut result = BatchResult::default();

        for (sheet_index, handle) in futures::future::join_all(
            batch_handles
                .into_iter()
                .map(|(sheet_index, handle)| async move { (sheet_index, handle.await) }),
        )
        .await
        {
            match handle {
                Ok(Ok(Some(report))) => {
                    result.success += 1;
                    result.scores.push(report.grade.score);
                }
                Ok(Ok(None)) => {
                    result.failed += 1;
                }
                Ok(Err(e)) => {
                    error!("[答题卡 #{}] ❌ 结果写入失败: {}", sheet_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[答题卡 #{}] 任务执行失败: {}", sheet_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 加载模板目录并选择本次使用的模板
async fn load_template(config: &Config) -> Result<Template> {
    info!("\n📁 正在加载模板: {}", config.template_folder);

    let templates = load_all_template_files(&config.template_folder).await?;
    if templates.is_empty() {
        return Err(AppError::from(TemplateError::EmptyStore {
            folder: config.template_folder.clone(),
        })
        .into());
    }

    let store = TemplateStore::open(MemoryStorage::with_templates(templates))?;
    let template = store.select(&config.template_id)?.clone();

    Ok(template)
}

/// 扫描目录中所有支持的答题卡图片，按文件名排序
pub async fn scan_sheet_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取答题卡目录: {}", folder.display()))?;

    let mut sheets = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            sheets.push(path);
        }
    }
    sheets.sort();

    Ok(sheets)
}
