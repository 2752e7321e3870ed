//! 统一错误处理模块
//!
//! 定义批量翻译引擎中所有错误类型，并区分可重试与致命错误

// 标准库导入
use std::time::Duration;

// 第三方crate导入
use anyhow::Error as AnyhowError;
use thiserror::Error;

// 本地模块导入
use crate::scheduler::BatchOutput;

/// 批量翻译统一错误类型
///
/// 单次调用的分类错误（`Auth`、`RateLimited`、`Transient`、`InvalidResponse`）
/// 由翻译客户端产生；`TranslationFailed` 是重试预算耗尽或遇到致命错误后的终态。
#[derive(Debug, Error)]
pub enum TranslationError {
    /// API密钥无效或无权限，不可重试
    #[error("API认证失败: {message}")]
    Auth {
        /// 错误消息
        message: String,
    },

    /// 触发速率限制 (HTTP 429)
    #[error("API速率限制{}", .retry_after.map(|d| format!("，建议等待 {}s", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// 服务端给出的等待提示
        retry_after: Option<Duration>,
    },

    /// 网络错误、超时或5xx
    #[error("网络请求失败{}: {message}", .status_code.map(|c| format!(" [{}]", c)).unwrap_or_default())]
    Transient {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// 响应格式无法解析
    #[error("API响应无效: {details}")]
    InvalidResponse {
        /// 具体错误信息
        details: String,
    },

    /// 单个任务的终态失败
    #[error("文件 {identifier} 翻译失败 after {attempts} attempts: {cause}")]
    TranslationFailed {
        /// 任务标识（通常是文件路径）
        identifier: String,
        /// 实际尝试次数
        attempts: usize,
        /// 最后一次失败原因
        cause: Box<TranslationError>,
    },

    /// 读取任务内容失败，批次会降级处理而不是中止
    #[error("读取内容失败 [{identifier}]: {source}")]
    ContentRead {
        /// 任务标识
        identifier: String,
        /// 底层IO错误
        #[source]
        source: std::io::Error,
    },

    /// 批次被调用方取消
    #[error("批量翻译已取消")]
    Cancelled,

    /// 配置相关错误
    #[error("配置错误 [{field}]: {reason}")]
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },

    /// 输入验证错误
    #[error("输入验证失败 [{input}]: {reason}")]
    InputValidation {
        /// 输入值
        input: String,
        /// 验证失败原因
        reason: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    #[error("内部处理错误: {0}")]
    Internal(#[from] AnyhowError),
}

impl TranslationError {
    /// 检查错误是否值得再次尝试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranslationError::RateLimited { .. }
                | TranslationError::Transient { .. }
                | TranslationError::InvalidResponse { .. }
        )
    }

    /// 终态失败对应的尝试次数
    pub fn attempts(&self) -> Option<usize> {
        match self {
            TranslationError::TranslationFailed { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// 批量翻译结果类型别名
pub type Result<T> = std::result::Result<T, TranslationError>;

/// 批次中止错误
///
/// 携带导致中止的任务和已经完成的部分结果，调用方可以选择保留这些输出。
#[derive(Debug, Error)]
#[error("批量翻译中止 ({}): {source}", .failed.as_deref().unwrap_or("-"))]
pub struct BatchError {
    /// 导致中止的任务标识；取消或输入错误时为空
    pub failed: Option<String>,
    /// 中止原因
    #[source]
    pub source: TranslationError,
    /// 中止前已记录的结果
    pub partial: BatchOutput,
}

impl BatchError {
    /// 不带部分结果的批次错误（例如输入校验失败）
    pub fn without_partial(source: TranslationError) -> Self {
        Self {
            failed: None,
            source,
            partial: BatchOutput::default(),
        }
    }
}

/// 便捷的错误创建宏
#[macro_export]
macro_rules! translation_error {
    (auth, $msg:expr) => {
        $crate::error::TranslationError::Auth {
            message: $msg.to_string(),
        }
    };
    (transient, $msg:expr) => {
        $crate::error::TranslationError::Transient {
            message: $msg.to_string(),
            status_code: None,
        }
    };
    (transient, $msg:expr, $code:expr) => {
        $crate::error::TranslationError::Transient {
            message: $msg.to_string(),
            status_code: Some($code),
        }
    };
    (invalid_response, $details:expr) => {
        $crate::error::TranslationError::InvalidResponse {
            details: $details.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::TranslationError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
    (input_validation, $input:expr, $reason:expr) => {
        $crate::error::TranslationError::InputValidation {
            input: $input.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 从reqwest::Error转换为TranslationError
///
/// 解码失败视为响应无效，其余（连接、超时、状态码）都是暂时性错误。
impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return TranslationError::InvalidResponse {
                details: error.to_string(),
            };
        }
        TranslationError::Transient {
            message: error.to_string(),
            status_code: error.status().map(|s| s.as_u16()),
        }
    }
}
