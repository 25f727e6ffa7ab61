//! 答案标记
//!
//! 识别服务用字符串通道返回每道题的答案，其中 `ANULADA` 表示无法确定的作答
//! （看不清、有涂改、多选）。这里给出类型化的视图，评分引擎仍然只做字符串比较。

use serde::{Deserialize, Serialize};

/// 无法确定作答时的保留标记
pub const ANULADA: &str = "ANULADA";

/// 单道题的作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerMark {
    /// 识别出的选项，如 "A"
    Marked(String),
    /// 看不清、涂改或多选
    ///
    /// 识别服务对这几种情况只返回同一个标记，因此这里不再细分。
    Unreadable,
}

impl AnswerMark {
    /// 从识别结果的字符串解析
    pub fn from_token(token: &str) -> Self {
        if token == ANULADA {
            AnswerMark::Unreadable
        } else {
            AnswerMark::Marked(token.to_string())
        }
    }

    /// 还原为评分引擎使用的字符串
    pub fn as_token(&self) -> &str {
        match self {
            AnswerMark::Marked(token) => token,
            AnswerMark::Unreadable => ANULADA,
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, AnswerMark::Unreadable)
    }
}

impl From<&str> for AnswerMark {
    fn from(token: &str) -> Self {
        Self::from_token(token)
    }
}

/// 规范化单个答案（去除首尾空白并转为大写）
///
/// 只在边界处使用：模板表单解析和识别结果解析。评分引擎不做任何规范化。
pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_maps_to_unreadable() {
        assert_eq!(AnswerMark::from_token("ANULADA"), AnswerMark::Unreadable);
        assert!(AnswerMark::from("ANULADA").is_unreadable());
        assert_eq!(AnswerMark::Unreadable.as_token(), "ANULADA");
    }

    #[test]
    fn test_marked_token_round_trip() {
        let mark = AnswerMark::from_token("C");
        assert_eq!(mark, AnswerMark::Marked("C".to_string()));
        assert_eq!(mark.as_token(), "C");
        assert!(!mark.is_unreadable());
    }

    #[test]
    fn test_sentinel_is_case_sensitive() {
        // 小写不是保留标记
        assert_eq!(
            AnswerMark::from_token("anulada"),
            AnswerMark::Marked("anulada".to_string())
        );
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  b "), "B");
        assert_eq!(normalize_token("anulada"), ANULADA);
        assert_eq!(normalize_token(""), "");
    }
}
