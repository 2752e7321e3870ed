//! 翻译客户端
//!
//! 对远端文本生成API执行一次翻译调用，并把结果分类为 [`AttemptOutcome`]。
//! 客户端自身不做重试，重试策略由 [`crate::retry`] 负责；唯一例外是速率限制，
//! 客户端会在返回前等待一次，避免持续冲击接口。

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api_constants::{language_name, mock_config};
use crate::config::EngineConfig;
use crate::error::{Result, TranslationError};

/// 单次翻译请求，按尝试临时构建
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationRequest<'a> {
    pub content: &'a str,
    pub target_language: &'a str,
    pub model: &'a str,
}

impl<'a> TranslationRequest<'a> {
    pub fn new(content: &'a str, target_language: &'a str, model: &'a str) -> Self {
        Self {
            content,
            target_language,
            model,
        }
    }
}

/// 单次尝试的结果，驱动重试状态机
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 翻译成功
    Success(String),
    /// 速率限制，附带服务端等待提示
    RateLimited(Option<Duration>),
    /// 可重试错误（网络、5xx、响应格式错误）
    RecoverableError(TranslationError),
    /// 不可重试错误（认证失败）
    FatalError(TranslationError),
}

impl AttemptOutcome {
    /// 转换为普通的 `Result`
    pub fn into_result(self) -> Result<String> {
        match self {
            AttemptOutcome::Success(text) => Ok(text),
            AttemptOutcome::RateLimited(retry_after) => {
                Err(TranslationError::RateLimited { retry_after })
            }
            AttemptOutcome::RecoverableError(e) | AttemptOutcome::FatalError(e) => Err(e),
        }
    }
}

/// 翻译后端抽象，调度器和重试逻辑只依赖这个接口
#[async_trait]
pub trait Translate: Send + Sync {
    /// 执行一次翻译尝试
    async fn attempt(&self, request: &TranslationRequest<'_>) -> AttemptOutcome;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenRouter 翻译客户端
///
/// 模拟模式在构造时确定，开启后不会发起任何网络请求。
#[derive(Debug, Clone)]
pub struct TranslationClient {
    http: Client,
    api_url: String,
    api_key: String,
    mock_mode: bool,
    rate_limit_wait: Duration,
    max_rate_limit_wait: Duration,
}

impl TranslationClient {
    /// 根据引擎配置创建客户端
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("创建HTTP客户端失败")?;

        Ok(Self {
            http,
            api_url: config.api_url().to_string(),
            api_key: config.api_key().unwrap_or_default().to_string(),
            mock_mode: config.is_mock(),
            rate_limit_wait: config.rate_limit_wait(),
            max_rate_limit_wait: config.max_rate_limit_wait(),
        })
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    /// 翻译一段文本，失败时返回分类后的错误
    pub async fn translate(&self, content: &str, target_language: &str, model: &str) -> Result<String> {
        self.attempt(&TranslationRequest::new(content, target_language, model))
            .await
            .into_result()
    }

    async fn call_api(&self, request: &TranslationRequest<'_>) -> AttemptOutcome {
        let payload = ChatCompletionRequest {
            model: request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(request.content, request.target_language),
            }],
        };

        let response = match self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify(e.into()),
        };

        let status = response.status();
        debug!("Response status: {}", status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("API密钥无效，请检查OPENROUTER_API_KEY");
            return classify(TranslationError::Auth {
                message: format!("Invalid API key ({})", status),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let hint = parse_retry_after(response.headers());
            let wait = hint.unwrap_or(self.rate_limit_wait).min(self.max_rate_limit_wait);
            warn!("API速率限制，等待 {:?} 后返回", wait);
            tokio::time::sleep(wait).await;
            return AttemptOutcome::RateLimited(hint);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return classify(TranslationError::Transient {
                message: truncate(&body, 200),
                status_code: Some(status.as_u16()),
            });
        }

        let body: ChatCompletionResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return classify(TranslationError::InvalidResponse {
                    details: e.to_string(),
                })
            }
        };

        match body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        {
            Some(content) => AttemptOutcome::Success(content.trim().to_string()),
            None => classify(TranslationError::InvalidResponse {
                details: "Invalid response from API".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Translate for TranslationClient {
    async fn attempt(&self, request: &TranslationRequest<'_>) -> AttemptOutcome {
        if self.mock_mode {
            return AttemptOutcome::Success(mock_translate(request.content));
        }
        self.call_api(request).await
    }
}

/// 按错误是否值得重试决定尝试结果
fn classify(error: TranslationError) -> AttemptOutcome {
    if error.is_retryable() {
        AttemptOutcome::RecoverableError(error)
    } else {
        AttemptOutcome::FatalError(error)
    }
}

/// 确定性的本地替换，用于无密钥环境
pub fn mock_translate(content: &str) -> String {
    if content.contains(mock_config::MARKER) {
        content.replace(mock_config::MARKER, mock_config::REPLACEMENT)
    } else {
        format!("{}{}", content, mock_config::FALLBACK_SUFFIX)
    }
}

/// 构建翻译提示词
pub fn build_prompt(content: &str, target_language: &str) -> String {
    format!(
        "Translate the following text to {}: {}",
        language_name(target_language),
        content
    )
}

fn parse_retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
