use crate::error::{AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的答题卡数量
    pub max_concurrent_sheets: usize,
    /// 模板 TOML 文件存放目录
    pub template_folder: String,
    /// 使用的模板（ID 或名称），为空时使用第一个模板
    pub template_id: String,
    /// 待批改的答题卡图片目录
    pub sheet_folder: String,
    /// 批改结果输出目录
    pub result_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_sheets: 4,
            template_folder: "templates".to_string(),
            template_id: String::new(),
            sheet_folder: "sheets".to_string(),
            result_folder: "results".to_string(),
            output_log_file: "grading_log.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_sheets: std::env::var("MAX_CONCURRENT_SHEETS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_concurrent_sheets),
            template_folder: std::env::var("TEMPLATE_FOLDER").unwrap_or(default.template_folder),
            template_id: std::env::var("TEMPLATE_ID").unwrap_or(default.template_id),
            sheet_folder: std::env::var("SHEET_FOLDER").unwrap_or(default.sheet_folder),
            result_folder: std::env::var("RESULT_FOLDER").unwrap_or(default.result_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL")
                .unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 检查配置是否可以开始批改
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_sheets == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_CONCURRENT_SHEETS".to_string(),
                reason: "并发数必须大于 0".to_string(),
            }
            .into());
        }
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_default_config_requires_api_key() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarNotFound { ref var_name })
                if var_name == "LLM_API_KEY"
        ));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let config = Config {
            max_concurrent_sheets: 0,
            llm_api_key: "sk-test".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_valid_config() {
        let config = Config {
            llm_api_key: "sk-test".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_parses_and_falls_back() {
        std::env::set_var("MAX_CONCURRENT_SHEETS", "7");
        std::env::set_var("VERBOSE_LOGGING", "talvez");
        std::env::set_var("LLM_MODEL_NAME", "gpt-4o");

        let config = Config::from_env();

        std::env::remove_var("MAX_CONCURRENT_SHEETS");
        std::env::remove_var("VERBOSE_LOGGING");
        std::env::remove_var("LLM_MODEL_NAME");

        assert_eq!(config.max_concurrent_sheets, 7);
        assert!(!config.verbose_logging);
        assert_eq!(config.llm_model_name, "gpt-4o");
    }
}
