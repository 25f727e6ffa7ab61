//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量答题卡处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载模板目录并选择模板
//! - 扫描答题卡目录
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息（含平均分）
//!
//! ### `sheet_processor` - 单张答题卡处理器
//! - 调用 `GradingFlow` 批改一张答题卡
//! - 写出 JSON 报告
//! - 在运行日志中记录成功或失败
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<答题卡>)
//!     ↓
//! sheet_processor (处理单张答题卡)
//!     ↓
//! workflow::GradingFlow (识别 → 评分)
//!     ↓
//! services (能力层：llm / scoring / template_store / result_writer)
//! ```

pub mod batch_processor;
pub mod sheet_processor;

// 重新导出主要类型
pub use batch_processor::{scan_sheet_folder, App, ProcessingStats};
pub use sheet_processor::process_sheet;
