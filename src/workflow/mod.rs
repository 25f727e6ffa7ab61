pub mod grading_flow;
pub mod sheet_ctx;

pub use grading_flow::{GradingFlow, PROCESS_IMAGE_FAILED};
pub use sheet_ctx::SheetCtx;
