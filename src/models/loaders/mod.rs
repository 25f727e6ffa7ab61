pub mod toml_loader;

pub use toml_loader::{load_all_template_files, load_template_file, parse_template_file};
