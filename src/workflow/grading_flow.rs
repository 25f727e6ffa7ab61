//! 批改流程 - 流程层
//!
//! 核心职责：定义"一张答题卡"的完整处理流程
//!
//! 流程顺序：
//! 1. 读取图片 → data URI
//! 2. 识别服务提取作答
//! 3. 评分引擎计算成绩
//!
//! 识别完成后才开始评分；识别失败时不产生任何部分结果。

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::grade::GradingReport;
use crate::models::template::{Template, TemplateDraft};
use crate::services::scoring::calculate_grades;
use crate::services::AnswerExtractor;
use crate::utils::image::read_image_as_data_uri;
use crate::utils::logging::truncate_text;
use crate::workflow::sheet_ctx::SheetCtx;

/// 识别失败时展示给用户的提示
pub const PROCESS_IMAGE_FAILED: &str = "无法处理图片，请使用更清晰的照片重试";

/// 批改流程
///
/// - 编排"识别 → 评分"的顺序
/// - 不持有任何文件或模板状态
/// - 只依赖识别能力（`AnswerExtractor`）
pub struct GradingFlow<E: AnswerExtractor> {
    extractor: Arc<E>,
    verbose_logging: bool,
}

impl<E: AnswerExtractor> Clone for GradingFlow<E> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            verbose_logging: self.verbose_logging,
        }
    }
}

impl<E: AnswerExtractor> GradingFlow<E> {
    pub fn new(extractor: Arc<E>, verbose_logging: bool) -> Self {
        Self {
            extractor,
            verbose_logging,
        }
    }

    /// 批改一张答题卡（图片已是 data URI）
    ///
    /// 返回识别出的作答与评分结果
    pub async fn grade_data_uri(
        &self,
        ctx: &SheetCtx,
        photo_data_uri: &str,
        template: &Template,
    ) -> AppResult<(Vec<String>, GradingReport)> {
        info!("{} 🔍 正在识别答题卡...", ctx);

        let extracted = self.extractor.extract_answers(photo_data_uri).await?;

        info!(
            "{} ✓ 识别完成，共 {} 个作答（模板 {} 题）",
            ctx,
            extracted.len(),
            template.question_count()
        );
        if extracted.len() != template.question_count() {
            warn!(
                "{} ⚠️ 作答数量 ({}) 与题目数量 ({}) 不一致",
                ctx,
                extracted.len(),
                template.question_count()
            );
        }
        if self.verbose_logging {
            info!("{} 作答: {}", ctx, truncate_text(&extracted.join(","), 200));
        }

        let report = calculate_grades(&extracted, &template.answer_key, template.weights());

        info!(
            "{} 📊 正确 {}/{}，得分 {}（{}）",
            ctx,
            report.grade.correct_answers,
            report.grade.total_questions,
            report.grade.score_text(),
            if report.grade.is_weighted() { "按分值" } else { "每题 1 分" }
        );

        Ok((extracted, report))
    }

    /// 批改一张答题卡图片文件
    pub async fn grade_file(
        &self,
        ctx: &SheetCtx,
        path: &Path,
        template: &Template,
    ) -> AppResult<(Vec<String>, GradingReport)> {
        let data_uri = read_image_as_data_uri(path).await?;
        self.grade_data_uri(ctx, &data_uri, template).await
    }

    /// 识别并评分，失败时返回 `None`
    ///
    /// 识别阶段的所有错误都在这里被捕获，记录日志并给出统一提示。
    /// `points` 为 `None` 时按每题 1 分评分。
    pub async fn grade_exam(
        &self,
        photo_data_uri: &str,
        answer_key: &[String],
        points: Option<&[f64]>,
    ) -> Option<GradingReport> {
        match self.extractor.extract_answers(photo_data_uri).await {
            Ok(extracted) => Some(calculate_grades(&extracted, answer_key, points)),
            Err(e) => {
                error!("批改失败: {}", e);
                warn!("{}", PROCESS_IMAGE_FAILED);
                None
            }
        }
    }

    /// 从标准答案卡照片生成模板草稿，每题默认 1 分
    pub async fn extract_key_template(
        &self,
        name: &str,
        photo_data_uri: &str,
    ) -> AppResult<TemplateDraft> {
        let answer_key = self.extractor.extract_answer_key(photo_data_uri).await?;
        info!("✓ 从答案卡识别出 {} 个标准答案", answer_key.len());

        let points = vec![1.0; answer_key.len()];
        TemplateDraft::new(name, answer_key, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ExtractionError, FileError};
    use crate::utils::image::to_data_uri;

    /// 返回固定结果的识别服务
    struct FakeExtractor {
        answers: Option<Vec<String>>,
    }

    impl FakeExtractor {
        fn ok(answers: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                answers: Some(answers.iter().map(|a| a.to_string()).collect()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { answers: None })
        }

        fn result(&self) -> AppResult<Vec<String>> {
            self.answers.clone().ok_or_else(|| {
                ExtractionError::MalformedResponse {
                    response: "garbage".to_string(),
                }
                .into()
            })
        }
    }

    impl AnswerExtractor for FakeExtractor {
        async fn extract_answers(&self, _photo_data_uri: &str) -> AppResult<Vec<String>> {
            self.result()
        }

        async fn extract_answer_key(&self, _photo_data_uri: &str) -> AppResult<Vec<String>> {
            self.result()
        }
    }

    fn template() -> Template {
        Template {
            id: "t-1".to_string(),
            name: "Biologia".to_string(),
            answer_key: vec!["A", "B", "C", "D"].into_iter().map(String::from).collect(),
            points: vec![1.0, 1.0, 2.0, 1.0],
        }
    }

    #[tokio::test]
    async fn test_grade_data_uri() {
        let flow = GradingFlow::new(FakeExtractor::ok(&["A", "C", "C", "ANULADA"]), true);
        let ctx = SheetCtx::new(1, "aluno.png", "t-1");

        let (extracted, report) = flow
            .grade_data_uri(&ctx, "data:image/png;base64,AAAA", &template())
            .await
            .unwrap();

        assert_eq!(extracted.len(), 4);
        assert_eq!(report.grade.earned_points, Some(3.0));
        assert_eq!(report.grade.total_points, Some(5.0));
        assert_eq!(report.grade.score, 60.0);
        assert_eq!(report.unreadable_questions(), vec![4]);
    }

    #[tokio::test]
    async fn test_template_without_points_is_unweighted() {
        let flow = GradingFlow::new(FakeExtractor::ok(&["A", "X", "C"]), false);
        let ctx = SheetCtx::new(1, "aluno.png", "t-2");
        let template = Template {
            id: "t-2".to_string(),
            name: "Sem pontos".to_string(),
            answer_key: vec!["A", "B", "C"].into_iter().map(String::from).collect(),
            points: Vec::new(),
        };

        let (_, report) = flow
            .grade_data_uri(&ctx, "data:image/png;base64,AAAA", &template)
            .await
            .unwrap();

        assert!(!report.grade.is_weighted());
        assert_eq!(report.grade.correct_answers, 2);
        assert!((report.grade.score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_grade_exam_failure_returns_none() {
        let flow = GradingFlow::new(FakeExtractor::failing(), false);
        let key = template().answer_key;
        assert!(flow.grade_exam("data:image/png;base64,AAAA", &key, None).await.is_none());
    }

    #[tokio::test]
    async fn test_grade_exam_unweighted() {
        let flow = GradingFlow::new(FakeExtractor::ok(&["A", "X", "C"]), false);
        let key: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        let report = flow
            .grade_exam("data:image/png;base64,AAAA", &key, None)
            .await
            .unwrap();
        assert_eq!(report.grade.correct_answers, 2);
        assert!((report.grade.score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_grade_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("aluno.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();

        let flow = GradingFlow::new(FakeExtractor::ok(&["A", "B", "C", "D"]), false);
        let ctx = SheetCtx::new(1, "aluno.jpg", "t-1");
        let (_, report) = flow.grade_file(&ctx, &path, &template()).await.unwrap();
        assert_eq!(report.grade.score, 100.0);
    }

    #[tokio::test]
    async fn test_grade_file_missing() {
        let flow = GradingFlow::new(FakeExtractor::ok(&["A"]), false);
        let ctx = SheetCtx::new(1, "missing.jpg", "t-1");
        let result = flow
            .grade_file(&ctx, Path::new("/no/such/missing.jpg"), &template())
            .await;
        assert!(matches!(result, Err(AppError::File(FileError::NotFound { .. }))));
    }

    #[tokio::test]
    async fn test_extract_key_template() {
        let flow = GradingFlow::new(FakeExtractor::ok(&["A", "E", "B"]), false);
        let uri = to_data_uri("image/png", &[0x89, 0x50, 0x4E, 0x47]);
        let draft = flow.extract_key_template("Gabarito", &uri).await.unwrap();
        assert_eq!(draft.answer_key, vec!["A", "E", "B"]);
        assert_eq!(draft.points, vec![1.0, 1.0, 1.0]);

        let failing = GradingFlow::new(FakeExtractor::failing(), false);
        assert!(failing.extract_key_template("Gabarito", &uri).await.is_err());
    }
}
