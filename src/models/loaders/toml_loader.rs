use crate::error::{AppError, AppResult, FileError};
use crate::models::template::{Template, TemplateFile};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从单个 TOML 文件加载模板
pub async fn load_template_file(toml_file_path: &Path) -> AppResult<Vec<Template>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    parse_template_file(&content, toml_file_path)
}

/// 解析模板文件内容
///
/// 校验不通过的模板会被跳过并记录警告，不会进入评分。
pub fn parse_template_file(content: &str, toml_file_path: &Path) -> AppResult<Vec<Template>> {
    let file: TemplateFile = toml::from_str(content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: toml_file_path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    let mut templates = Vec::with_capacity(file.templates.len());
    for template in file.templates {
        match template.validate() {
            Ok(()) => templates.push(template),
            Err(e) => tracing::warn!(
                "跳过无效模板 {} ({}): {}",
                template.name,
                toml_file_path.display(),
                e
            ),
        }
    }

    Ok(templates)
}

/// 从文件夹中加载所有 TOML 文件中的模板
///
/// 无法解析的文件会被跳过并记录警告。
pub async fn load_all_template_files(folder_path: &str) -> AppResult<Vec<Template>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    // read_dir 的顺序不固定
    toml_files.sort();

    let mut templates = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载模板文件: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_template_file(&path).await {
            Ok(loaded) => {
                tracing::info!("成功加载 {} 个模板", loaded.len());
                templates.extend(loaded);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(templates)
}
