//! 模板存储服务 - 业务能力层
//!
//! 只负责模板的增删改查，存储介质通过 `TemplateStorage` 注入。

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError, TemplateError};
use crate::models::loaders::parse_template_file;
use crate::models::template::{Template, TemplateDraft, TemplateFile};

/// 模板的持久化介质
pub trait TemplateStorage {
    /// 读取全部模板
    fn load(&self) -> AppResult<Vec<Template>>;
    /// 覆盖保存全部模板
    fn save(&self, templates: &[Template]) -> AppResult<()>;
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStorage {
    templates: Mutex<Vec<Template>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            templates: Mutex::new(templates),
        }
    }
}

impl TemplateStorage for MemoryStorage {
    fn load(&self) -> AppResult<Vec<Template>> {
        Ok(self
            .templates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, templates: &[Template]) -> AppResult<()> {
        *self
            .templates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = templates.to_vec();
        Ok(())
    }
}

/// 单个 TOML 文件存储，文件不存在时视为空
#[derive(Debug, Clone)]
pub struct TomlFileStorage {
    path: PathBuf,
}

impl TomlFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemplateStorage for TomlFileStorage {
    fn load(&self) -> AppResult<Vec<Template>> {
        if !self.path.exists() {
            debug!("模板文件不存在，视为空: {}", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::file_read_failed(self.path.display().to_string(), e))?;
        parse_template_file(&content, &self.path)
    }

    fn save(&self, templates: &[Template]) -> AppResult<()> {
        let file = TemplateFile {
            templates: templates.to_vec(),
        };
        let content = toml::to_string_pretty(&file).map_err(|e| {
            AppError::File(FileError::WriteFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
            }
        }
        std::fs::write(&self.path, content)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        Ok(())
    }
}

/// 模板存储
///
/// 职责：
/// - 持有模板列表的快照
/// - 每次修改后整体写回存储
/// - 写回失败时内存中的列表保持修改前的状态
pub struct TemplateStore<S: TemplateStorage> {
    storage: S,
    templates: Vec<Template>,
}

impl<S: TemplateStorage> TemplateStore<S> {
    /// 打开存储并读取已有模板
    pub fn open(storage: S) -> AppResult<Self> {
        let templates = storage.load()?;
        debug!("已读取 {} 个模板", templates.len());
        Ok(Self { storage, templates })
    }

    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: &str) -> AppResult<&Template> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::template_not_found(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// 按 ID 或名称选择模板，为空时选择第一个
    pub fn select(&self, id_or_name: &str) -> AppResult<&Template> {
        let id_or_name = id_or_name.trim();
        if id_or_name.is_empty() {
            return self
                .templates
                .first()
                .ok_or_else(|| AppError::template_not_found("<默认模板>"));
        }
        self.templates
            .iter()
            .find(|t| t.matches(id_or_name))
            .ok_or_else(|| AppError::template_not_found(id_or_name))
    }

    /// 新建模板
    pub fn create(&mut self, draft: TemplateDraft) -> AppResult<Template> {
        let template = Template::from_draft(draft);
        let mut next = self.templates.clone();
        next.push(template.clone());
        self.commit(next)?;
        info!("✓ 模板创建成功: {} ({} 题)", template.name, template.question_count());
        Ok(template)
    }

    /// 用新的表单内容替换模板，ID 保持不变
    pub fn update(&mut self, id: &str, draft: TemplateDraft) -> AppResult<Template> {
        let position = self.position(id)?;
        let updated = Template {
            id: id.to_string(),
            name: draft.name,
            answer_key: draft.answer_key,
            points: draft.points,
        };
        let mut next = self.templates.clone();
        next[position] = updated.clone();
        self.commit(next)?;
        info!("✓ 模板已更新: {}", updated.name);
        Ok(updated)
    }

    /// 删除模板，返回被删除的模板
    pub fn delete(&mut self, id: &str) -> AppResult<Template> {
        let position = self.position(id)?;
        let mut next = self.templates.clone();
        let removed = next.remove(position);
        self.commit(next)?;
        info!("✓ 模板已删除: {}", removed.name);
        Ok(removed)
    }

    fn position(&self, id: &str) -> AppResult<usize> {
        self.templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| {
                TemplateError::NotFound {
                    id: id.to_string(),
                }
                .into()
            })
    }

    fn commit(&mut self, next: Vec<Template>) -> AppResult<()> {
        self.storage.save(&next)?;
        self.templates = next;
        Ok(())
    }
}
