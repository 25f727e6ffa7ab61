use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerMark;

/// 成绩汇总
///
/// `total_points` / `earned_points` 只在按分值评分时出现。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub total_questions: usize,
    /// 百分制得分，范围 [0, 100]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_points: Option<f64>,
}

impl GradeSummary {
    /// 得分文本，保留一位小数，如 `60.0%`
    pub fn score_text(&self) -> String {
        format!("{:.1}%", self.score)
    }

    pub fn is_weighted(&self) -> bool {
        self.total_points.is_some()
    }
}

/// 单道题的批改明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    /// 题号（从 1 开始）
    pub question: usize,
    /// 学生作答，缺失时为空字符串
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_points: Option<f64>,
}

impl QuestionDetail {
    /// 学生作答的类型化视图
    pub fn student_mark(&self) -> AnswerMark {
        AnswerMark::from_token(&self.student_answer)
    }
}

/// 一次评分的完整结果：汇总与逐题明细总是一起返回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingReport {
    pub grade: GradeSummary,
    pub details: Vec<QuestionDetail>,
}

impl GradingReport {
    /// 作答无法确定（ANULADA）的题号
    pub fn unreadable_questions(&self) -> Vec<usize> {
        self.details
            .iter()
            .filter(|d| d.student_mark().is_unreadable())
            .map(|d| d.question)
            .collect()
    }

    /// 答错的题号
    pub fn incorrect_questions(&self) -> Vec<usize> {
        self.details
            .iter()
            .filter(|d| !d.is_correct)
            .map(|d| d.question)
            .collect()
    }
}

/// 批量批改时每张答题卡写出的报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetReport {
    /// 答题卡文件名
    pub sheet: String,
    pub template_id: String,
    pub template_name: String,
    /// RFC 3339 时间
    pub graded_at: String,
    pub extracted_answers: Vec<String>,
    pub grade: GradeSummary,
    pub details: Vec<QuestionDetail>,
}

impl SheetReport {
    pub fn new(
        sheet: impl Into<String>,
        template_id: impl Into<String>,
        template_name: impl Into<String>,
        extracted_answers: Vec<String>,
        report: GradingReport,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            template_id: template_id.into(),
            template_name: template_name.into(),
            graded_at: chrono::Local::now().to_rfc3339(),
            extracted_answers,
            grade: report.grade,
            details: report.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(question: usize, student: &str, correct: &str) -> QuestionDetail {
        QuestionDetail {
            question,
            student_answer: student.to_string(),
            correct_answer: correct.to_string(),
            is_correct: student == correct,
            points: None,
            earned_points: None,
        }
    }

    #[test]
    fn test_unweighted_summary_omits_point_fields() {
        let summary = GradeSummary {
            correct_answers: 2,
            incorrect_answers: 1,
            total_questions: 3,
            score: 200.0 / 3.0,
            total_points: None,
            earned_points: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["correctAnswers"], 2);
        assert_eq!(json["incorrectAnswers"], 1);
        assert_eq!(json["totalQuestions"], 3);
        assert!(json.get("totalPoints").is_none());
        assert!(json.get("earnedPoints").is_none());
        assert_eq!(summary.score_text(), "66.7%");
        assert!(!summary.is_weighted());
    }

    #[test]
    fn test_detail_uses_camel_case() {
        let mut d = detail(1, "A", "A");
        d.points = Some(2.0);
        d.earned_points = Some(2.0);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["question"], 1);
        assert_eq!(json["studentAnswer"], "A");
        assert_eq!(json["correctAnswer"], "A");
        assert_eq!(json["isCorrect"], true);
        assert_eq!(json["earnedPoints"], 2.0);
    }

    #[test]
    fn test_report_question_lists() {
        let report = GradingReport {
            grade: GradeSummary {
                correct_answers: 1,
                incorrect_answers: 2,
                total_questions: 3,
                score: 100.0 / 3.0,
                total_points: None,
                earned_points: None,
            },
            details: vec![detail(1, "A", "A"), detail(2, "ANULADA", "B"), detail(3, "", "C")],
        };
        assert_eq!(report.unreadable_questions(), vec![2]);
        assert_eq!(report.incorrect_questions(), vec![2, 3]);
    }
}
