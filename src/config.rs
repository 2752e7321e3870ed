//! 配置管理模块
//!
//! 提供CLI参数解析、`.env` 环境变量加载和翻译引擎配置管理功能

// 标准库导入
use std::path::PathBuf;
use std::time::Duration;

// 第三方crate导入
use clap::{Parser, ValueEnum};
use tracing::{debug, warn};

// 本地模块导入
use crate::api_constants::{
    api_config, env_keys, is_supported_language, is_valid_api_url, retry_config, service_config,
};
use crate::error::{Result, TranslationError};
use crate::retry::RetryPolicy;
use crate::scheduler::BatchSettings;

/// 单个任务终态失败后的批次处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// 任一任务重试耗尽即中止整个批次
    #[default]
    Abort,
    /// 记录错误并保留原文，批次继续
    KeepOriginal,
}

/// 翻译引擎配置结构体
///
/// 支持Builder模式进行链式配置。模拟模式作为普通配置项传入客户端，
/// 不存在进程级全局开关。
///
/// # Examples
///
/// ```rust
/// use batch_translator::config::{EngineConfig, FailurePolicy};
///
/// let config = EngineConfig::new()
///     .target_language("ja")
///     .with_model("gpt-4o-mini")
///     .with_concurrency(8)
///     .with_failure_policy(FailurePolicy::KeepOriginal)
///     .mock_mode(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 目标语言代码 (如: zh, en, ja, ko)
    target_lang: String,
    /// 模型名称
    model: String,
    /// 翻译API服务地址
    api_url: String,
    /// API密钥，模拟模式下可为空
    api_key: Option<String>,
    /// 是否使用本地模拟翻译
    mock_mode: bool,
    /// 并发工作者数量
    concurrency: usize,
    /// 每个任务的最大尝试次数
    max_attempts: usize,
    /// 退避基数
    backoff_base: Duration,
    /// 速率限制时客户端的默认等待
    rate_limit_wait: Duration,
    /// 服务端等待提示的上限
    max_rate_limit_wait: Duration,
    /// 终态失败处理策略
    failure_policy: FailurePolicy,
    /// 单次请求超时
    request_timeout: Duration,
}

impl EngineConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：目标语言 "zh"、模型 gpt-3.5-turbo、并发 5、最多尝试 5 次、
    /// 失败即中止批次。
    pub fn new() -> Self {
        Self {
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            model: api_config::DEFAULT_MODEL.to_string(),
            api_url: api_config::DEFAULT_API_URL.to_string(),
            api_key: None,
            mock_mode: false,
            concurrency: service_config::DEFAULT_CONCURRENCY,
            max_attempts: retry_config::DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(retry_config::BACKOFF_BASE_SECONDS),
            rate_limit_wait: Duration::from_secs(retry_config::RATE_LIMIT_WAIT_SECONDS),
            max_rate_limit_wait: Duration::from_secs(retry_config::MAX_RATE_LIMIT_WAIT_SECONDS),
            failure_policy: FailurePolicy::default(),
            request_timeout: Duration::from_secs(api_config::REQUEST_TIMEOUT_SECONDS),
        }
    }

    /// 获取目标语言代码
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// 获取模型名称
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 获取API地址
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 获取API密钥
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// 是否启用模拟模式
    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    /// 获取并发数量
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 获取最大尝试次数
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn rate_limit_wait(&self) -> Duration {
        self.rate_limit_wait
    }

    pub fn max_rate_limit_wait(&self) -> Duration {
        self.max_rate_limit_wait
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// 设置目标语言代码
    pub fn target_language(mut self, lang: &str) -> Self {
        self.target_lang = lang.to_string();
        self
    }

    /// 设置模型
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// 设置API地址
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// 设置API密钥
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// 设置是否启用模拟模式
    pub fn mock_mode(mut self, enable: bool) -> Self {
        self.mock_mode = enable;
        self
    }

    /// 设置并发数量
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// 设置最大尝试次数
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// 设置退避基数
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.rate_limit_wait = wait;
        self
    }

    /// 设置 Retry-After 等待上限
    pub fn with_max_rate_limit_wait(mut self, cap: Duration) -> Self {
        self.max_rate_limit_wait = cap;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 设置终态失败处理策略
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// 当前配置对应的重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts).with_backoff_base(self.backoff_base)
    }

    /// 调度器使用的批次参数
    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            target_language: self.target_lang.clone(),
            model: self.model.clone(),
            retry: self.retry_policy(),
            failure_policy: self.failure_policy,
        }
    }

    /// 校验配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(TranslationError::Configuration {
                field: "concurrency".to_string(),
                reason: "并发数量必须大于0".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(TranslationError::Configuration {
                field: "max_attempts".to_string(),
                reason: "最大尝试次数必须大于0".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(TranslationError::Configuration {
                field: "model".to_string(),
                reason: "模型名称不能为空".to_string(),
            });
        }
        if !self.mock_mode {
            if !is_valid_api_url(&self.api_url) {
                return Err(TranslationError::Configuration {
                    field: "api_url".to_string(),
                    reason: format!("API地址必须以http://或https://开头: {}", self.api_url),
                });
            }
            if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                return Err(TranslationError::Configuration {
                    field: env_keys::API_KEY.to_string(),
                    reason: "未找到API密钥，请在 .env 中设置".to_string(),
                });
            }
        }
        Ok(())
    }

    /// 合并命令行参数与环境变量，命令行优先
    pub fn from_sources(cli: &Cli, env: &EnvSettings) -> Result<Self> {
        let mut config = Self::new()
            .target_language(&cli.target_lang)
            .with_max_attempts(cli.max_attempts)
            .with_failure_policy(cli.on_failure)
            .mock_mode(cli.mock || env.mock_mode);

        if let Some(model) = cli.model.as_deref().or(env.model.as_deref()) {
            config = config.with_model(model);
        }
        if let Some(url) = cli.api.as_deref() {
            config = config.with_api_url(url);
        }
        if let Some(key) = env.api_key.as_deref() {
            config = config.with_api_key(key);
        }
        if let Some(threads) = cli.threads.or(env.num_threads) {
            config = config.with_concurrency(threads);
        }

        config.validate()?;
        if !is_supported_language(config.target_lang()) {
            warn!("⚠️  目标语言 {} 不在已知列表中，将原样用于提示词", config.target_lang());
        }
        debug!("引擎配置: {:?}", config.redacted());
        Ok(config)
    }

    /// 日志输出用副本，隐藏密钥
    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_key.is_some() {
            copy.api_key = Some("****".to_string());
        }
        copy
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 从环境（及 `.env` 文件）读取的配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvSettings {
    pub api_key: Option<String>,
    pub num_threads: Option<usize>,
    pub model: Option<String>,
    pub mock_mode: bool,
    pub file_types: Vec<String>,
}

impl EnvSettings {
    /// 加载 `.env` 后读取进程环境变量
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("已加载环境变量文件: {}", path.display()),
            Err(e) => debug!("未找到 .env 文件或加载失败: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构建，便于测试
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty(env_keys::API_KEY),
            num_threads: non_empty(env_keys::NUM_THREADS).and_then(|v| v.trim().parse().ok()),
            model: non_empty(env_keys::MODEL),
            mock_mode: non_empty(env_keys::MOCK_MODE)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            file_types: non_empty(env_keys::FILE_TYPES)
                .map(|v| crate::utils::parse_file_types(&v))
                .unwrap_or_default(),
        }
    }
}

/// CLI参数结构
#[derive(Parser, Debug)]
#[command(author, version, about = "并发批量文件翻译工具 - 基于OpenRouter API，支持重试退避与实时进度", long_about = None)]
pub struct Cli {
    /// 输入文件路径列表（多个文件）
    #[arg(short, long, value_name = "FILE", num_args = 1.., conflicts_with = "input_dir")]
    pub input: Vec<PathBuf>,

    /// 输入目录路径（递归翻译目录下匹配类型的文件）
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// 单个输出文件路径（仅限单文件输入）
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 输出目录路径（用于多文件输入）
    #[arg(long, value_name = "DIR", default_value = service_config::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// 目标语言代码 (如: zh, en, ja, ko)
    #[arg(short, long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub target_lang: String,

    /// 模型名称（覆盖 .env 中的 MODEL）
    #[arg(long)]
    pub model: Option<String>,

    /// 翻译API地址
    #[arg(long)]
    pub api: Option<String>,

    /// 文件类型列表（逗号分隔，如 txt,md）
    #[arg(long)]
    pub file_types: Option<String>,

    /// 并发工作者数量（覆盖 .env 中的 NUM_THREADS）
    #[arg(long)]
    pub threads: Option<usize>,

    /// 每个文件的最大尝试次数
    #[arg(long, default_value_t = retry_config::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    /// 单个文件最终失败时的处理方式
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_failure: FailurePolicy,

    /// 使用本地模拟翻译，不调用API
    #[arg(long)]
    pub mock: bool,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示批次统计
    #[arg(long)]
    pub stats: bool,

    /// 要翻译的文本（未指定输入文件时使用；都为空则读取stdin）
    pub text: Vec<String>,
}
