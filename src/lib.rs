//! Batch Translator - 并发批量翻译引擎
//!
//! 这个库提供翻译客户端、单文件重试包装、有界工作者池调度和进度上报等核心功能。

pub mod api_constants;
pub mod config;
pub mod error;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod stats;
pub mod translator;
pub mod utils;

pub use config::{EngineConfig, FailurePolicy};
pub use error::{BatchError, TranslationError};
pub use progress::{LatestProgress, ProgressEvent, ProgressLog, ProgressObserver};
pub use retry::{attempt_with_retry, RetryPolicy};
pub use scheduler::{BatchOutput, BatchScheduler, BatchSettings, Job, JobSource, JobWarning};
pub use translator::{AttemptOutcome, Translate, TranslationClient, TranslationRequest};
