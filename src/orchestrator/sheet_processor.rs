//! 单张答题卡处理器 - 编排层
//!
//! 调用批改流程，并把结果写入报告和运行日志。

use std::path::Path;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::grade::SheetReport;
use crate::models::template::Template;
use crate::services::{AnswerExtractor, ResultWriter};
use crate::workflow::{GradingFlow, SheetCtx, PROCESS_IMAGE_FAILED};

/// 处理单张答题卡
///
/// # 返回
/// - `Ok(Some(report))`: 批改成功，报告已写出
/// - `Ok(None)`: 图片无法处理（识别失败、格式不支持等），已记录到运行日志
/// - `Err(_)`: 结果无法写出
pub async fn process_sheet<E: AnswerExtractor>(
    flow: &GradingFlow<E>,
    ctx: &SheetCtx,
    path: &Path,
    template: &Template,
    writer: &ResultWriter,
) -> AppResult<Option<SheetReport>> {
    info!("{} 开始批改", ctx);

    let (extracted, report) = match flow.grade_file(ctx, path, template).await {
        Ok(result) => result,
        Err(e) => {
            warn!("{} ❌ {}: {}", ctx, PROCESS_IMAGE_FAILED, e);
            writer
                .append_failure(&ctx.sheet_name, &format!("{}: {}", PROCESS_IMAGE_FAILED, e))
                .await?;
            return Ok(None);
        }
    };

    let sheet_report = SheetReport::new(
        ctx.sheet_name.clone(),
        template.id.clone(),
        template.name.clone(),
        extracted,
        report,
    );

    let report_path = writer.write_report(&sheet_report).await?;
    writer.append_success(&sheet_report).await?;

    info!("{} ✓ 报告已保存: {}", ctx, report_path.display());

    Ok(Some(sheet_report))
}
