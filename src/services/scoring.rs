//! 评分引擎 - 业务能力层
//!
//! 纯函数：(识别出的答案, 标准答案, 可选的每题分值) → 成绩汇总 + 逐题明细。
//!
//! - 只读取 `0..answer_key.len()` 范围内的数据，多余的作答和分值被忽略
//! - 缺失的作答按空字符串处理，空字符串永远不等于任何标准答案
//! - 答案按字符串逐字比较，区分大小写，`ANULADA` 不做特殊处理
//! - 不传分值时每题 1 分，得分 = 答对数 / 总题数 * 100
//! - 传入分值时，缺失的分值按 0 处理，负数和非有限值也按 0 处理
//! - 任何输入都不会出错，总题数或总分为 0 时得分为 0，分值总和溢出时得分也为 0

use crate::models::grade::{GradeSummary, GradingReport, QuestionDetail};

/// 计算成绩
///
/// # 参数
/// - `extracted_answers`: 识别服务返回的作答
/// - `answer_key`: 标准答案
/// - `points`: 每题分值，`None` 表示不按分值评分
///
/// # 示例
/// ```
/// use answer_sheet_grader::services::scoring::calculate_grades;
///
/// let report = calculate_grades(
///     &["A", "C", "C", "ANULADA"],
///     &["A", "B", "C", "D"],
///     Some(&[1.0, 1.0, 2.0, 1.0][..]),
/// );
/// assert_eq!(report.grade.correct_answers, 2);
/// assert_eq!(report.grade.earned_points, Some(3.0));
/// assert_eq!(report.grade.score, 60.0);
/// ```
pub fn calculate_grades<A, K>(
    extracted_answers: &[A],
    answer_key: &[K],
    points: Option<&[f64]>,
) -> GradingReport
where
    A: AsRef<str>,
    K: AsRef<str>,
{
    let total_questions = answer_key.len();
    let mut correct_answers = 0;
    let mut incorrect_answers = 0;
    let mut total_points = 0.0;
    let mut earned_points = 0.0;
    let mut details = Vec::with_capacity(total_questions);

    for (index, correct) in answer_key.iter().enumerate() {
        let correct = correct.as_ref();
        let student = extracted_answers
            .get(index)
            .map(|a| a.as_ref())
            .unwrap_or("");
        let is_correct = student == correct;

        if is_correct {
            correct_answers += 1;
        } else {
            incorrect_answers += 1;
        }

        let (question_points, question_earned) = match points {
            Some(weights) => {
                let weight = sanitize_weight(weights.get(index).copied());
                let earned = if is_correct { weight } else { 0.0 };
                total_points += weight;
                earned_points += earned;
                (Some(weight), Some(earned))
            }
            None => (None, None),
        };

        details.push(QuestionDetail {
            question: index + 1,
            student_answer: student.to_string(),
            correct_answer: correct.to_string(),
            is_correct,
            points: question_points,
            earned_points: question_earned,
        });
    }

    let grade = match points {
        Some(_) => GradeSummary {
            correct_answers,
            incorrect_answers,
            total_questions,
            score: percentage(earned_points, total_points),
            total_points: Some(total_points),
            earned_points: Some(earned_points),
        },
        None => GradeSummary {
            correct_answers,
            incorrect_answers,
            total_questions,
            score: percentage(correct_answers as f64, total_questions as f64),
            total_points: None,
            earned_points: None,
        },
    };

    GradingReport { grade, details }
}

/// 缺失、负数或非有限的分值按 0 处理
fn sanitize_weight(weight: Option<f64>) -> f64 {
    match weight {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => 0.0,
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    // 分值总和溢出为 inf 时 inf/inf 为 NaN，clamp 不会处理 NaN
    let ratio = part / whole * 100.0;
    if ratio.is_finite() {
        // 浮点累加可能让结果略超 100
        ratio.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
