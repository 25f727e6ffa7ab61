//! LLM 服务 - 业务能力层
//!
//! 只负责"从答题卡照片中识别答案"能力，不关心评分和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（需要模型支持图片输入）

use std::future::Future;
use std::sync::LazyLock;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ExtractionError};
use crate::models::answer::{normalize_token, ANULADA};
use crate::utils::image::validate_image_payload;

static RE_FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("代码块正则无效"));

/// 答案识别能力
///
/// 输入为图片（data URI 或 http(s) 地址），输出为每道题一个答案，
/// 无法确定的作答用 `ANULADA` 表示。
pub trait AnswerExtractor: Send + Sync {
    /// 识别学生答题卡上的作答
    fn extract_answers(
        &self,
        photo_data_uri: &str,
    ) -> impl Future<Output = AppResult<Vec<String>>> + Send;

    /// 识别标准答案卡上的答案
    fn extract_answer_key(
        &self,
        photo_data_uri: &str,
    ) -> impl Future<Output = AppResult<Vec<String>>> + Send;
}

const SYSTEM_MESSAGE: &str = "You are an AI assistant that reads multiple-choice answer sheets \
                              and replies with JSON only.";

const STUDENT_SHEET_PROMPT: &str = r#"You are an AI assistant designed to extract answers from student answer sheets.

Analyze the image provided and extract the answers marked by the student.

For each question, identify the marked answer (e.g., 'A', 'B', 'C', 'D', 'E').
- If you cannot read the answer for a question, classify it as "ANULADA".
- If a question has erasures, classify it as "ANULADA".
- If a question has more than one option marked, classify it as "ANULADA".

Return the answers, in question order, as a JSON object of the form
{"extractedAnswers": ["A", "B", ...]} and nothing else."#;

const ANSWER_KEY_PROMPT: &str = r#"You are an AI assistant designed to extract correct answers from an answer key sheet.

Analyze the image provided and extract the answers for each question.

For each question, identify the marked answer (e.g., 'A', 'B', 'C', 'D', 'E').
- If you cannot read the answer for a question, classify it as "ANULADA".

Return the answers, in question order, as a JSON object of the form
{"extractedAnswers": ["A", "B", ...]} and nothing else."#;

/// 识别服务返回的 JSON 结构
#[derive(Debug, Deserialize)]
struct ExtractionOutput {
    #[serde(rename = "extractedAnswers")]
    extracted_answers: Vec<String>,
}

/// LLM 服务
///
/// 职责：
/// - 调用兼容 OpenAI 的多模态接口识别答题卡
/// - 把模型输出解析为答案列表
/// - 不做评分，不做重试
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `imgs`: 图片列表（data URI 或 URL），会追加到用户消息中
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        imgs: &[String],
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符, 图片 {} 张", user_message.len(), imgs.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.service_error(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if imgs.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| self.service_error(e))?
        } else {
            // Vision API：文本 + 图片
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(imgs.len() + 1);

            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            ));

            for url in imgs {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            // 答题卡需要看清每个涂卡位置
                            detail: Some(ImageDetail::High),
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(|e| self.service_error(e))?
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| self.service_error(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.service_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ExtractionError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 发送图片和提示词，并解析答案列表
    async fn extract_with_prompt(
        &self,
        prompt: &str,
        photo_data_uri: &str,
    ) -> AppResult<Vec<String>> {
        validate_image_payload(photo_data_uri)?;

        let imgs = [photo_data_uri.trim().to_string()];
        let response = self.send_to_llm(prompt, Some(SYSTEM_MESSAGE), &imgs).await?;

        let answers = parse_extraction_response(&response)?;
        debug!("识别出 {} 个答案", answers.len());
        Ok(answers)
    }

    fn service_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> AppError {
        AppError::extraction_failed(&self.model_name, source)
    }
}

impl AnswerExtractor for LlmService {
    async fn extract_answers(&self, photo_data_uri: &str) -> AppResult<Vec<String>> {
        self.extract_with_prompt(STUDENT_SHEET_PROMPT, photo_data_uri).await
    }

    async fn extract_answer_key(&self, photo_data_uri: &str) -> AppResult<Vec<String>> {
        self.extract_with_prompt(ANSWER_KEY_PROMPT, photo_data_uri).await
    }
}

/// 解析识别服务的响应
///
/// 接受以下几种形式：
/// - `{"extractedAnswers": [...]}`
/// - 包在 ```json 代码块中的上述 JSON
/// - 夹在说明文字中的 JSON 对象
/// - 直接返回的 JSON 数组
///
/// 每个答案会被规范化（去空白、转大写），空答案记为 `ANULADA`。
pub fn parse_extraction_response(response: &str) -> AppResult<Vec<String>> {
    let response = response.trim();

    let mut candidates: Vec<&str> = vec![response];

    if let Some(inner) = RE_FENCED_JSON.captures(response).and_then(|c| c.get(1)) {
        candidates.push(inner.as_str().trim());
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            candidates.push(&response[start..=end]);
        }
    }

    if let (Some(start), Some(end)) = (response.find('['), response.rfind(']')) {
        if start < end {
            candidates.push(&response[start..=end]);
        }
    }

    for candidate in candidates {
        if let Ok(output) = serde_json::from_str::<ExtractionOutput>(candidate) {
            return Ok(normalize_answers(output.extracted_answers));
        }
        if let Ok(answers) = serde_json::from_str::<Vec<String>>(candidate) {
            return Ok(normalize_answers(answers));
        }
    }

    warn!("无法解析识别结果: '{}'", response);
    Err(ExtractionError::MalformedResponse {
        response: response.to_string(),
    }
    .into())
}

fn normalize_answers(raw: Vec<String>) -> Vec<String> {
    raw.iter()
        .map(|a| {
            let token = normalize_token(a);
            if token.is_empty() {
                ANULADA.to_string()
            } else {
                token
            }
        })
        .collect()
}
