//! 单文件重试包装
//!
//! 在有限次数内反复调用翻译客户端，失败之间按指数退避等待。

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::api_constants::retry_config;
use crate::error::{Result, TranslationError};
use crate::translator::{AttemptOutcome, Translate, TranslationRequest};

/// 重试策略：最大尝试次数与退避基数
///
/// 第 `n` 次（从0开始）失败后等待 `base * 2^(n+1)`，默认即 2s、4s、8s、16s。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff_base: Duration,
}

impl RetryPolicy {
    /// 创建策略，尝试次数至少为1
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base: Duration::from_secs(retry_config::BACKOFF_BASE_SECONDS),
        }
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// 第 `attempt_index` 次失败后的等待时间
    pub fn backoff_delay(&self, attempt_index: usize) -> Duration {
        let exponent = (attempt_index + 1).min(30) as u32;
        self.backoff_base.saturating_mul(1u32 << exponent)
    }

    /// 耗尽全部尝试时的总等待时间（最后一次失败后不再等待）
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts - 1)
            .map(|i| self.backoff_delay(i))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(retry_config::DEFAULT_MAX_ATTEMPTS)
    }
}

/// 带重试地翻译一个任务的内容
///
/// 空白内容直接原样返回，不发起调用也不计入尝试次数。认证等致命错误立即终止；
/// 可重试错误在预算内退避重试，耗尽后返回 [`TranslationError::TranslationFailed`]。
pub async fn attempt_with_retry<T>(
    client: &T,
    identifier: &str,
    request: &TranslationRequest<'_>,
    policy: &RetryPolicy,
) -> Result<String>
where
    T: Translate + ?Sized,
{
    if request.content.trim().is_empty() {
        debug!("文件 {} 内容为空，跳过翻译", identifier);
        return Ok(request.content.to_string());
    }

    let max_attempts = policy.max_attempts();
    let mut last_error: Option<TranslationError> = None;

    for attempt in 0..max_attempts {
        debug!("文件 {} API call attempt {}/{}", identifier, attempt + 1, max_attempts);

        match client.attempt(request).await {
            AttemptOutcome::Success(text) => {
                if attempt > 0 {
                    info!("✅ 文件 {} 重试成功 (第 {} 次尝试)", identifier, attempt + 1);
                }
                return Ok(text);
            }
            AttemptOutcome::FatalError(cause) => {
                error!("❌ 文件 {} 翻译失败，不可重试: {}", identifier, cause);
                return Err(TranslationError::TranslationFailed {
                    identifier: identifier.to_string(),
                    attempts: attempt + 1,
                    cause: Box::new(cause),
                });
            }
            AttemptOutcome::RateLimited(retry_after) => {
                last_error = Some(TranslationError::RateLimited { retry_after });
            }
            AttemptOutcome::RecoverableError(cause) => {
                last_error = Some(cause);
            }
        }

        if attempt + 1 < max_attempts {
            let wait = policy.backoff_delay(attempt);
            warn!(
                "文件 {} 翻译重试 {}/{}，等待 {:?}: {}",
                identifier,
                attempt + 1,
                max_attempts,
                wait,
                last_error.as_ref().map(ToString::to_string).unwrap_or_default()
            );
            tokio::time::sleep(wait).await;
        }
    }

    let cause = last_error.unwrap_or_else(|| TranslationError::Transient {
        message: "Max retries exceeded".to_string(),
        status_code: None,
    });
    error!("❌ 文件 {} 翻译失败 after {} attempts: {}", identifier, max_attempts, cause);

    Err(TranslationError::TranslationFailed {
        identifier: identifier.to_string(),
        attempts: max_attempts,
        cause: Box::new(cause),
    })
}
