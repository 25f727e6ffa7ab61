//! # Answer Sheet Grader
//!
//! 通过视觉大模型识别答题卡照片并按模板自动批改的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/` - 作答标记、模板、成绩报告
//! - `loaders` - 从 TOML 文件加载模板
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `scoring` - 纯函数评分引擎（加权 / 不加权）
//! - `TemplateStore` - 模板的增删改查，存储可替换
//! - `LlmService` - 视觉模型识别作答
//! - `ResultWriter` - 写出 JSON 报告和运行日志
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张答题卡"的完整处理流程
//! - `SheetCtx` - 上下文封装（答题卡编号 + 模板）
//! - `GradingFlow` - 流程编排（读取图片 → 识别 → 评分）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理答题卡，管理并发
//! - `orchestrator/sheet_processor` - 单张答题卡处理，写出结果
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerMark, GradingReport, SheetReport, Template, TemplateDraft, ANULADA};
pub use orchestrator::{process_sheet, App, ProcessingStats};
pub use services::{calculate_grades, AnswerExtractor, LlmService, TemplateStore};
pub use workflow::{GradingFlow, SheetCtx};
