use thiserror::Error;

/// 应用程序错误类型
///
/// 评分引擎本身不会返回错误；这里的错误全部来自外部协作方
/// （识别服务、模板存储、文件系统、配置）。
#[derive(Debug, Error)]
pub enum AppError {
    /// 答案识别服务错误
    #[error("识别错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// 模板相关错误
    #[error("模板错误: {0}")]
    Template(#[from] TemplateError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 答案识别服务错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 服务不可达或调用失败
    #[error("识别服务调用失败 (模型: {model}): {source}")]
    ServiceUnavailable {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 模型返回内容为空
    #[error("识别服务返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 模型返回内容无法解析为答案列表
    #[error("无法解析识别结果 (响应: {response})")]
    MalformedResponse { response: String },
    /// 图片数据不合法
    #[error("图片数据不合法: {reason}")]
    InvalidImage { reason: String },
}

/// 模板相关错误
#[derive(Debug, Error)]
pub enum TemplateError {
    /// 模板不存在
    #[error("模板不存在: {id}")]
    NotFound { id: String },
    /// 表单字段校验失败
    #[error("字段 {field} 校验失败: {message}")]
    Validation { field: String, message: String },
    /// 模板文件夹中没有任何模板
    #[error("文件夹 {folder} 中没有可用的模板")]
    EmptyStore { folder: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 序列化或解析失败
    #[error("JSON处理失败: {source}")]
    JsonFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {var_name} 不合法: {reason}")]
    InvalidValue { var_name: String, reason: String },
    /// 必需的环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::Extraction(ExtractionError::ServiceUnavailable {
            model: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建识别服务调用错误
    pub fn extraction_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Extraction(ExtractionError::ServiceUnavailable {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建字段校验错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Template(TemplateError::Validation {
            field: field.into(),
            message: message.into(),
        })
    }

    /// 创建模板不存在错误
    pub fn template_not_found(id: impl Into<String>) -> Self {
        AppError::Template(TemplateError::NotFound { id: id.into() })
    }

    /// 是否为识别阶段的错误
    pub fn is_extraction(&self) -> bool {
        matches!(self, AppError::Extraction(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = AppError::validation("points", "分值数量必须与题目数量一致");
        assert!(matches!(
            err,
            AppError::Template(TemplateError::Validation { ref field, .. }) if field == "points"
        ));
        assert_eq!(
            err.to_string(),
            "模板错误: 字段 points 校验失败: 分值数量必须与题目数量一致"
        );
    }

    #[test]
    fn test_io_error_converts_to_file_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::File(FileError::ReadFailed { .. })));
        assert!(!err.is_extraction());
    }

    #[test]
    fn test_extraction_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AppError::extraction_failed("gpt-4o-mini", io);
        assert!(err.is_extraction());
        assert!(err.to_string().contains("gpt-4o-mini"));
    }
}
