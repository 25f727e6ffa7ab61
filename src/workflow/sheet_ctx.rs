//! 答题卡处理上下文
//!
//! 封装"我正在用哪个模板批改第几张答题卡"这一信息

use std::fmt::Display;

/// 答题卡处理上下文
#[derive(Debug, Clone)]
pub struct SheetCtx {
    /// 答题卡索引（从1开始，仅用于日志显示）
    pub sheet_index: usize,

    /// 答题卡文件名
    pub sheet_name: String,

    /// 模板ID
    pub template_id: String,
}

impl SheetCtx {
    pub fn new(
        sheet_index: usize,
        sheet_name: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Self {
        Self {
            sheet_index,
            sheet_name: sheet_name.into(),
            template_id: template_id.into(),
        }
    }
}

impl Display for SheetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[答题卡 #{} {}]", self.sheet_index, self.sheet_name)
    }
}
