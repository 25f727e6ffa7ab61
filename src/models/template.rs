//! 答案模板（标准答案 + 每题分值）

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::answer::normalize_token;

/// 已保存的模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub answer_key: Vec<String>,
    #[serde(default)]
    pub points: Vec<f64>,
}

impl Template {
    /// 由草稿生成新模板，分配 UUID
    pub fn from_draft(draft: TemplateDraft) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            answer_key: draft.answer_key,
            points: draft.points,
        }
    }

    pub fn question_count(&self) -> usize {
        self.answer_key.len()
    }

    /// 评分用的分值；未配置分值时为 `None`，按每题 1 分评分
    pub fn weights(&self) -> Option<&[f64]> {
        if self.points.is_empty() {
            None
        } else {
            Some(&self.points)
        }
    }

    pub fn total_points(&self) -> f64 {
        match self.weights() {
            Some(points) => points.iter().sum(),
            None => self.question_count() as f64,
        }
    }

    /// 校验从文件加载的模板，规则与表单一致，允许不配置分值
    pub fn validate(&self) -> AppResult<()> {
        check_template(&self.name, &self.answer_key, self.weights())
    }

    /// 按 ID 或名称匹配
    pub fn matches(&self, id_or_name: &str) -> bool {
        self.id == id_or_name || self.name == id_or_name
    }
}

/// TOML 模板文件的结构：一个文件可以包含多个 `[[templates]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateFile {
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// 尚未保存的模板（表单输入校验后的结果）
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDraft {
    pub name: String,
    pub answer_key: Vec<String>,
    pub points: Vec<f64>,
}

impl TemplateDraft {
    /// 解析表单输入
    ///
    /// - `answer_key_input`: 逗号分隔的答案，如 `A, B, C`
    /// - `points_input`: 逗号分隔的分值，如 `1, 1, 2`
    ///
    /// 答案和分值数量不一致时返回 `points` 字段的校验错误。
    pub fn parse(name: &str, answer_key_input: &str, points_input: &str) -> AppResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "模板名称不能为空"));
        }

        if answer_key_input.trim().is_empty() {
            return Err(AppError::validation(
                "answerKey",
                "标准答案不能为空，请用逗号分隔 (例: A,B,C)",
            ));
        }
        let answer_key: Vec<String> = answer_key_input.split(',').map(normalize_token).collect();

        if points_input.trim().is_empty() {
            return Err(AppError::validation(
                "points",
                "每题分值不能为空，请用逗号分隔 (例: 1,1,2)",
            ));
        }
        let points = points_input
            .split(',')
            .map(parse_point)
            .collect::<AppResult<Vec<f64>>>()?;

        Self::new(name, answer_key, points)
    }

    /// 由已拆分的数据创建草稿，校验题目数量与分值数量
    pub fn new(
        name: impl Into<String>,
        answer_key: Vec<String>,
        points: Vec<f64>,
    ) -> AppResult<Self> {
        let name = name.into();
        check_template(&name, &answer_key, Some(&points))?;
        Ok(Self {
            name,
            answer_key,
            points,
        })
    }
}

/// 名称非空、标准答案非空且无空项、分值为非负有限数且与题目数量一致
fn check_template(name: &str, answer_key: &[String], points: Option<&[f64]>) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "模板名称不能为空"));
    }
    if answer_key.is_empty() {
        return Err(AppError::validation("answerKey", "标准答案不能为空"));
    }
    if answer_key.iter().any(|a| a.trim().is_empty()) {
        return Err(AppError::validation("answerKey", "标准答案中存在空项"));
    }
    if let Some(points) = points {
        if let Some(bad) = points.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(AppError::validation("points", format!("无效的分值: '{}'", bad)));
        }
        if answer_key.len() != points.len() {
            return Err(AppError::validation(
                "points",
                format!(
                    "分值数量 ({}) 必须与题目数量 ({}) 一致",
                    points.len(),
                    answer_key.len()
                ),
            ));
        }
    }
    Ok(())
}

fn parse_point(raw: &str) -> AppResult<f64> {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(AppError::validation(
            "points",
            format!("无效的分值: '{}'", raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Template(TemplateError::Validation { field, .. }) => field,
            other => panic!("不是校验错误: {other}"),
        }
    }

    #[test]
    fn test_parse_normalizes_answers() {
        let draft = TemplateDraft::parse(" Biologia 1 ", "a, b ,C,d", "1, 1, 2, 1").unwrap();
        assert_eq!(draft.name, "Biologia 1");
        assert_eq!(draft.answer_key, vec!["A", "B", "C", "D"]);
        assert_eq!(draft.points, vec![1.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_parse_accepts_fractional_points() {
        let draft = TemplateDraft::parse("Quiz", "A,B", "0.5, 1.5").unwrap();
        assert_eq!(draft.points, vec![0.5, 1.5]);
    }

    #[test]
    fn test_shape_mismatch_is_points_field_error() {
        let err = TemplateDraft::parse("Quiz", "A,B,C", "1,1").unwrap_err();
        assert_eq!(field_of(err), "points");
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        assert_eq!(field_of(TemplateDraft::parse("  ", "A", "1").unwrap_err()), "name");
        assert_eq!(field_of(TemplateDraft::parse("Quiz", " ", "1").unwrap_err()), "answerKey");
        assert_eq!(field_of(TemplateDraft::parse("Quiz", "A", "").unwrap_err()), "points");
    }

    #[test]
    fn test_invalid_points_are_rejected() {
        assert_eq!(field_of(TemplateDraft::parse("Quiz", "A,B", "1,x").unwrap_err()), "points");
        assert_eq!(field_of(TemplateDraft::parse("Quiz", "A,B", "1,-2").unwrap_err()), "points");
        assert_eq!(field_of(TemplateDraft::parse("Quiz", "A,B", "1,NaN").unwrap_err()), "points");
    }

    #[test]
    fn test_blank_answer_entry_is_rejected() {
        let err = TemplateDraft::parse("Quiz", "A,,C", "1,1,1").unwrap_err();
        assert_eq!(field_of(err), "answerKey");
    }

    #[test]
    fn test_template_from_draft() {
        let draft = TemplateDraft::parse("Quiz", "A,B,C", "1,2,3").unwrap();
        let template = Template::from_draft(draft);
        assert_eq!(template.question_count(), 3);
        assert_eq!(template.total_points(), 6.0);
        assert!(uuid::Uuid::parse_str(&template.id).is_ok());
        assert!(template.matches("Quiz"));
        assert!(template.matches(&template.id.clone()));
    }

    #[test]
    fn test_template_file_toml() {
        let content = r#"
[[templates]]
id = "t-1"
name = "Prova 1"
answerKey = ["A", "B"]
points = [1.0, 2.0]

[[templates]]
id = "t-2"
name = "Prova 2"
answerKey = ["C"]
"#;
        let file: TemplateFile = toml::from_str(content).unwrap();
        assert_eq!(file.templates.len(), 2);
        assert_eq!(file.templates[0].answer_key, vec!["A", "B"]);
        assert!(file.templates[1].points.is_empty());
        assert_eq!(file.templates[1].weights(), None);
        assert_eq!(file.templates[1].total_points(), 1.0);
        assert!(file.templates[1].validate().is_ok());
    }

    fn loaded(answer_key: &[&str], points: Vec<f64>) -> Template {
        Template {
            id: "t-1".to_string(),
            name: "Prova".to_string(),
            answer_key: answer_key.iter().map(|a| a.to_string()).collect(),
            points,
        }
    }

    #[test]
    fn test_validate_loaded_template() {
        assert!(loaded(&["A", "B"], vec![1.0, 2.0]).validate().is_ok());
        assert!(loaded(&["A", "B"], vec![]).validate().is_ok());

        let short_points = loaded(&["A", "B", "C", "D"], vec![1.0]);
        assert_eq!(field_of(short_points.validate().unwrap_err()), "points");
        let negative = loaded(&["A", "B"], vec![1.0, -1.0]);
        assert_eq!(field_of(negative.validate().unwrap_err()), "points");
        let blank_entry = loaded(&["A", " "], vec![1.0, 1.0]);
        assert_eq!(field_of(blank_entry.validate().unwrap_err()), "answerKey");
        assert_eq!(field_of(loaded(&[], vec![]).validate().unwrap_err()), "answerKey");

        let mut unnamed = loaded(&["A"], vec![1.0]);
        unnamed.name = " ".to_string();
        assert_eq!(field_of(unnamed.validate().unwrap_err()), "name");
    }

    #[test]
    fn test_draft_rejects_empty_answer_key() {
        let err = TemplateDraft::new("Quiz", Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(field_of(err), "answerKey");
    }
}
