pub mod answer;
pub mod grade;
pub mod loaders;
pub mod template;

pub use answer::{normalize_token, AnswerMark, ANULADA};
pub use grade::{GradeSummary, GradingReport, QuestionDetail, SheetReport};
pub use loaders::{load_all_template_files, load_template_file};
pub use template::{Template, TemplateDraft, TemplateFile};
