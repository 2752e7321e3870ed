/// 翻译API配置常量
///
/// 该文件定义了翻译服务、重试与进度相关的常量配置，方便统一管理和维护

/// 远端文本生成API配置
pub mod api_config {
    /// OpenRouter chat completions 接口
    pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

    /// 默认模型
    pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 60;
}

/// 环境变量名称
pub mod env_keys {
    pub const API_KEY: &str = "OPENROUTER_API_KEY";
    pub const NUM_THREADS: &str = "NUM_THREADS";
    pub const MODEL: &str = "MODEL";
    pub const MOCK_MODE: &str = "MOCK_MODE";
    pub const FILE_TYPES: &str = "FILE_TYPES";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "zh";

    /// 默认并发工作者数量
    pub const DEFAULT_CONCURRENCY: usize = 5;

    /// 默认输出目录
    pub const DEFAULT_OUTPUT_DIR: &str = "translated";

    /// 支持的语言代码与提示词中使用的语言名称
    pub const LANGUAGE_NAMES: &[(&str, &str)] = &[
        ("zh", "Chinese"),
        ("en", "English"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("fr", "French"),
        ("de", "German"),
        ("es", "Spanish"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("ar", "Arabic"),
        ("hi", "Hindi"),
        ("th", "Thai"),
        ("vi", "Vietnamese"),
        ("nl", "Dutch"),
        ("pl", "Polish"),
    ];
}

/// 重试与退避配置
pub mod retry_config {
    /// 每个文件的最大尝试次数
    pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

    /// 退避基数（秒），第 n 次失败后等待 base * 2^(n+1)
    pub const BACKOFF_BASE_SECONDS: u64 = 1;

    /// 速率限制且服务端未给出提示时，客户端自行等待的时间（秒）
    pub const RATE_LIMIT_WAIT_SECONDS: u64 = 2;

    /// 服务端 Retry-After 提示的等待上限（秒）
    pub const MAX_RATE_LIMIT_WAIT_SECONDS: u64 = 60;
}

/// 模拟模式配置
pub mod mock_config {
    /// 被替换的标记词
    pub const MARKER: &str = "Hello";

    /// 标记词的译文
    pub const REPLACEMENT: &str = "你好";

    /// 不含标记词时追加的后缀
    pub const FALLBACK_SUFFIX: &str = " (mock translated)";
}

/// 进度上报配置
pub mod progress_config {
    /// 进度事件队列默认容量
    pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
}

/// 将语言代码转换为提示词中的语言名称，未知代码原样返回
pub fn language_name(code: &str) -> &str {
    service_config::LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 验证语言代码是否在已知列表中
pub fn is_supported_language(lang: &str) -> bool {
    service_config::LANGUAGE_NAMES
        .iter()
        .any(|(code, _)| code.eq_ignore_ascii_case(lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name_lookup() {
        assert_eq!(language_name("zh"), "Chinese");
        assert_eq!(language_name("JA"), "Japanese");
        assert_eq!(language_name("Klingon"), "Klingon");
    }

    #[test]
    fn test_language_validation() {
        assert!(is_supported_language("zh"));
        assert!(is_supported_language("en"));
        assert!(!is_supported_language("xx"));
    }

    #[test]
    fn test_api_url_validation() {
        assert!(is_valid_api_url("https://openrouter.ai/api/v1/chat/completions"));
        assert!(is_valid_api_url("http://localhost:8080"));
        assert!(!is_valid_api_url("ftp://example.com"));
        assert!(!is_valid_api_url("invalid-url"));
    }
}
