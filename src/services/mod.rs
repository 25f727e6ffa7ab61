pub mod llm_service;
pub mod result_writer;
pub mod scoring;
pub mod template_store;

pub use llm_service::{AnswerExtractor, LlmService};
pub use result_writer::ResultWriter;
pub use scoring::calculate_grades;
pub use template_store::{MemoryStorage, TemplateStorage, TemplateStore, TomlFileStorage};
