//! 批量调度器
//!
//! 固定数量的工作者从共享队列领取任务，各自调用重试包装器，
//! 完成结果通过通道发送给唯一的收集端。结果映射、完成计数和进度事件
//! 只由收集端修改，结果按完成先后收集，与提交顺序无关。

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::FailurePolicy;
use crate::error::{BatchError, TranslationError};
use crate::progress::{ProgressObserver, ProgressReporter};
use crate::retry::{attempt_with_retry, RetryPolicy};
use crate::translation_error;
use crate::translator::{Translate, TranslationRequest};

/// 任务内容来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// 调用方已读取好的内容
    Inline(String),
    /// 由工作者读取的文件
    File(PathBuf),
}

/// 一个待翻译的任务，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    identifier: String,
    source: JobSource,
}

impl Job {
    pub fn inline(identifier: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            source: JobSource::Inline(content.into()),
        }
    }

    /// 以文件路径作为任务标识
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            identifier: path.display().to_string(),
            source: JobSource::File(path.to_path_buf()),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn source(&self) -> &JobSource {
        &self.source
    }
}

/// 被降级处理的任务记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobWarning {
    pub identifier: String,
    pub message: String,
}

/// 批次输出：结果映射、降级警告和（保留原文策略下的）失败记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub results: HashMap<String, String>,
    pub warnings: Vec<JobWarning>,
    /// 按发生顺序记录的 (任务标识, 错误消息)
    pub errors: Vec<(String, String)>,
}

impl BatchOutput {
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.results.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// 调度器每个任务使用的翻译参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    pub target_language: String,
    pub model: String,
    pub retry: RetryPolicy,
    pub failure_policy: FailurePolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        crate::config::EngineConfig::default().batch_settings()
    }
}

/// 工作者发回收集端的单个任务结果
#[derive(Debug)]
enum JobOutcome {
    Translated(String),
    /// 内容读取失败或处理异常，使用原文
    Degraded { content: String, warning: String },
    /// 重试耗尽或致命错误
    Failed { error: TranslationError, original: String },
}

#[derive(Debug)]
struct JobCompletion {
    identifier: String,
    outcome: JobOutcome,
}

/// 仅收集端持有的批次状态
struct BatchState {
    total: usize,
    completed: usize,
    output: BatchOutput,
}

impl BatchState {
    fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            output: BatchOutput::default(),
        }
    }

    /// 记录一个任务结果；中止策略下的终态失败原样返回给调用方
    fn record(
        &mut self,
        completion: JobCompletion,
        policy: FailurePolicy,
        reporter: &mut ProgressReporter,
    ) -> Option<(String, TranslationError)> {
        let JobCompletion { identifier, outcome } = completion;
        match outcome {
            JobOutcome::Translated(text) => {
                debug!("✅ 文件 {} 翻译完成", identifier);
                self.insert(identifier, text);
                reporter.job_completed(None);
            }
            JobOutcome::Degraded { content, warning } => {
                warn!("⚠️  文件 {} 使用原始内容: {}", identifier, warning);
                self.output.warnings.push(JobWarning {
                    identifier: identifier.clone(),
                    message: warning.clone(),
                });
                self.insert(identifier, content);
                reporter.job_completed(Some(warning));
            }
            JobOutcome::Failed { error, original } => match policy {
                FailurePolicy::Abort => {
                    error!("文件 {} 翻译失败，标记整个翻译失败: {}", identifier, error);
                    self.completed = (self.completed + 1).min(self.total);
                    reporter.job_completed(Some(error.to_string()));
                    return Some((identifier, error));
                }
                FailurePolicy::KeepOriginal => {
                    warn!("文件 {} 翻译失败，保留原文: {}", identifier, error);
                    let message = error.to_string();
                    self.output.errors.push((identifier.clone(), message.clone()));
                    self.insert(identifier, original);
                    reporter.job_completed(Some(message));
                }
            },
        }
        None
    }

    fn insert(&mut self, identifier: String, content: String) {
        let previous = self.output.results.insert(identifier, content);
        debug_assert!(previous.is_none(), "每个任务只应写入一次结果");
        self.completed = (self.completed + 1).min(self.total);
    }
}

/// 批量翻译调度器
pub struct BatchScheduler<T> {
    client: Arc<T>,
    settings: Arc<BatchSettings>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl<T> BatchScheduler<T>
where
    T: Translate + 'static,
{
    pub fn new(client: T, settings: BatchSettings) -> Self {
        Self {
            client: Arc::new(client),
            settings: Arc::new(settings),
            observer: None,
        }
    }

    /// 挂载进度观察者
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// 并发翻译一批任务，返回 标识 -> 译文 的映射
    pub async fn run_batch(&self, jobs: Vec<Job>, concurrency: usize) -> Result<BatchOutput, BatchError> {
        self.run_batch_with_cancel(jobs, concurrency, CancellationToken::new())
            .await
    }

    /// 同 [`Self::run_batch`]，可由调用方通过 `cancel` 中途取消
    pub async fn run_batch_with_cancel(
        &self,
        jobs: Vec<Job>,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Result<BatchOutput, BatchError> {
        validate_jobs(&jobs, concurrency).map_err(BatchError::without_partial)?;

        let total = jobs.len();
        if total == 0 {
            return Ok(BatchOutput::default());
        }

        let worker_count = concurrency.min(total);
        info!("🚀 开始批量翻译: {} 个任务, {} 个工作者", total, worker_count);

        let mut state = BatchState::new(total);
        let mut reporter = ProgressReporter::new(total, self.observer.clone());

        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (tx, mut rx) = mpsc::channel::<JobCompletion>(worker_count);
        let worker_cancel = cancel.child_token();

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&self.client),
                Arc::clone(&self.settings),
                Arc::clone(&queue),
                tx.clone(),
                worker_cancel.clone(),
            ));
        }
        drop(tx);

        let policy = self.settings.failure_policy;
        loop {
            let completion = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    workers.abort_all();
                    // 已进入通道缓冲的结果属于已完成任务
                    while let Ok(buffered) = rx.try_recv() {
                        if let Some((identifier, _)) = state.record(buffered, policy, &mut reporter) {
                            debug!("取消时丢弃失败任务 {}", identifier);
                        }
                    }
                    warn!("批量翻译被取消，已完成 {}/{}", state.completed, total);
                    return Err(BatchError {
                        failed: None,
                        source: TranslationError::Cancelled,
                        partial: state.output,
                    });
                }
                completion = rx.recv() => completion,
            };

            let Some(completion) = completion else {
                break;
            };

            if let Some((identifier, error)) = state.record(completion, policy, &mut reporter) {
                worker_cancel.cancel();
                workers.abort_all();
                return Err(BatchError {
                    failed: Some(identifier),
                    source: error,
                    partial: state.output,
                });
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("工作者异常退出: {}", e);
            }
        }

        if state.completed < total {
            return Err(BatchError {
                failed: None,
                source: TranslationError::Internal(anyhow::anyhow!(
                    "仅收到 {}/{} 个任务结果",
                    state.completed,
                    total
                )),
                partial: state.output,
            });
        }

        info!("📊 批量翻译完成: {} 个结果, {} 个降级, {} 个失败",
            state.output.results.len(),
            state.output.warnings.len(),
            state.output.errors.len()
        );
        Ok(state.output)
    }
}

fn validate_jobs(jobs: &[Job], concurrency: usize) -> Result<(), TranslationError> {
    if concurrency == 0 {
        return Err(translation_error!(config, "concurrency", "并发数量必须大于0"));
    }

    let mut seen = HashSet::with_capacity(jobs.len());
    for job in jobs {
        if !seen.insert(job.identifier()) {
            return Err(translation_error!(input_validation, job.identifier(), "任务标识重复"));
        }
    }
    Ok(())
}

async fn worker_loop<T>(
    worker_id: usize,
    client: Arc<T>,
    settings: Arc<BatchSettings>,
    queue: Arc<Mutex<VecDeque<Job>>>,
    tx: mpsc::Sender<JobCompletion>,
    cancel: CancellationToken,
) where
    T: Translate + 'static,
{
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some(job) = next else {
            break;
        };

        debug!("工作者 {} 领取任务 {}", worker_id, job.identifier());

        let completion = tokio::select! {
            _ = cancel.cancelled() => break,
            completion = process_job(client.as_ref(), &settings, job) => completion,
        };

        if tx.send(completion).await.is_err() {
            break;
        }
    }
    debug!("工作者 {} 退出", worker_id);
}

async fn process_job<T>(client: &T, settings: &BatchSettings, job: Job) -> JobCompletion
where
    T: Translate + ?Sized,
{
    let identifier = job.identifier;

    let content = match read_content(&identifier, &job.source).await {
        Ok(content) => content,
        Err(e) => {
            let content = best_effort_content(&job.source).await;
            return JobCompletion {
                identifier,
                outcome: JobOutcome::Degraded {
                    content,
                    warning: e.to_string(),
                },
            };
        }
    };

    let request = TranslationRequest::new(&content, &settings.target_language, &settings.model);
    let result = AssertUnwindSafe(attempt_with_retry(client, &identifier, &request, &settings.retry))
        .catch_unwind()
        .await;

    let outcome = match result {
        Ok(Ok(text)) => JobOutcome::Translated(text),
        Ok(Err(error)) => JobOutcome::Failed {
            error,
            original: content,
        },
        Err(panic) => JobOutcome::Degraded {
            content,
            warning: format!("处理文件时出错: {}", panic_message(panic.as_ref())),
        },
    };

    JobCompletion { identifier, outcome }
}

async fn read_content(identifier: &str, source: &JobSource) -> Result<String, TranslationError> {
    match source {
        JobSource::Inline(content) => Ok(content.clone()),
        JobSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TranslationError::ContentRead {
                identifier: identifier.to_string(),
                source,
            }),
    }
}

/// 读取失败后尽量取回原文：非UTF-8按有损解码，完全不可读则为空
async fn best_effort_content(source: &JobSource) -> String {
    match source {
        JobSource::Inline(content) => content.clone(),
        JobSource::File(path) => match tokio::fs::read(path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        },
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::progress::ProgressLog;
    use crate::translator::{mock_translate, AttemptOutcome, TranslationClient};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn mock_scheduler() -> BatchScheduler<TranslationClient> {
        let config = EngineConfig::new().mock_mode(true);
        let client = TranslationClient::new(&config).unwrap();
        BatchScheduler::new(client, config.batch_settings())
    }

    fn settings(policy: FailurePolicy) -> BatchSettings {
        BatchSettings {
            failure_policy: policy,
            ..BatchSettings::default()
        }
    }

    /// 内容含 "FAIL" 时总是返回暂时性错误，含 "AUTH" 时返回认证错误，
    /// 含 "PANIC" 时直接panic，含 "CANCEL" 时触发挂载的取消令牌；
    /// 可选的延迟用于打乱完成顺序
    struct FakeClient {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        delay: Duration,
        cancel_on_marker: Option<CancellationToken>,
    }

    impl FakeClient {
        fn new() -> Self {
            Self::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                delay,
                cancel_on_marker: None,
            }
        }

        fn cancelling(token: CancellationToken) -> Self {
            Self {
                cancel_on_marker: Some(token),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Translate for FakeClient {
        async fn attempt(&self, request: &TranslationRequest<'_>) -> AttemptOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                let factor = request.content.len() as u32 % 3 + 1;
                tokio::time::sleep(self.delay * factor).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if request.content.contains("CANCEL") {
                if let Some(token) = &self.cancel_on_marker {
                    token.cancel();
                }
            }
            if request.content.contains("PANIC") {
                panic!("unexpected local failure");
            }
            if request.content.contains("AUTH") {
                return AttemptOutcome::FatalError(TranslationError::Auth {
                    message: "Invalid API key".to_string(),
                });
            }
            if request.content.contains("FAIL") {
                return AttemptOutcome::RecoverableError(TranslationError::Transient {
                    message: "simulated outage".to_string(),
                    status_code: Some(502),
                });
            }
            AttemptOutcome::Success(mock_translate(request.content))
        }
    }

    #[tokio::test]
    async fn test_three_mock_jobs_with_two_workers() {
        let log = Arc::new(ProgressLog::default());
        let scheduler = mock_scheduler().with_observer(log.clone());
        let jobs = vec![
            Job::inline("a.txt", "Hello"),
            Job::inline("b.txt", "Hello"),
            Job::inline("c.txt", "Hello"),
        ];

        let output = scheduler.run_batch(jobs, 2).await.unwrap();

        assert_eq!(output.len(), 3);
        assert!(output.results.values().all(|text| text == "你好"));
        assert!(output.warnings.is_empty());

        let events = log.snapshot();
        assert_eq!(events.len(), 3);
        assert_eq!(events.last().unwrap().percentage, 100.0);
        assert!(events.windows(2).all(|w| w[0].percentage <= w[1].percentage));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_failing_job_aborts_after_max_attempts() {
        let log = Arc::new(ProgressLog::default());
        let scheduler = BatchScheduler::new(FakeClient::new(), settings(FailurePolicy::Abort))
            .with_observer(log.clone());

        let err = scheduler
            .run_batch(vec![Job::inline("only.txt", "FAIL")], 5)
            .await
            .unwrap_err();

        assert_eq!(scheduler.client.calls.load(Ordering::SeqCst), 5);
        assert_eq!(err.failed.as_deref(), Some("only.txt"));
        assert!(matches!(
            err.source,
            TranslationError::TranslationFailed { attempts: 5, .. }
        ));
        assert!(err.partial.is_empty());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_content_degrades_to_original() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("a.txt");
        let bad = dir.path().join("b.txt");
        std::fs::write(&good, "Hello").unwrap();
        std::fs::write(&bad, b"Hello \xff\xfe world").unwrap();

        let scheduler = mock_scheduler();
        let jobs = vec![Job::from_file(&good), Job::from_file(&bad)];
        let bad_id = bad.display().to_string();

        let output = scheduler.run_batch(jobs, 2).await.unwrap();

        assert_eq!(output.get(&good.display().to_string()), Some("你好"));
        assert_eq!(output.get(&bad_id), Some("Hello \u{FFFD}\u{FFFD} world"));
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].identifier, bad_id);
        assert!(output.errors.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_degrades_to_empty_content() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        let output = mock_scheduler()
            .run_batch(vec![Job::from_file(&missing), Job::inline("x", "Hello")], 2)
            .await
            .unwrap();

        assert_eq!(output.get(&missing.display().to_string()), Some(""));
        assert_eq!(output.get("x"), Some("你好"));
        assert_eq!(output.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_job_keeps_original_content() {
        let scheduler = BatchScheduler::new(FakeClient::new(), settings(FailurePolicy::Abort));
        let jobs = vec![Job::inline("boom", "PANIC here"), Job::inline("ok", "Hello")];

        let output = scheduler.run_batch(jobs, 2).await.unwrap();

        assert_eq!(output.get("boom"), Some("PANIC here"));
        assert_eq!(output.get("ok"), Some("你好"));
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("unexpected local failure"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_aborts_but_keeps_partial_results() {
        let scheduler = BatchScheduler::new(FakeClient::new(), settings(FailurePolicy::Abort));
        let jobs = vec![
            Job::inline("first", "Hello"),
            Job::inline("second", "AUTH"),
            Job::inline("third", "Hello"),
        ];

        let err = scheduler.run_batch(jobs, 1).await.unwrap_err();

        assert_eq!(err.failed.as_deref(), Some("second"));
        assert_eq!(err.source.attempts(), Some(1));
        assert_eq!(err.partial.get("first"), Some("你好"));
        assert!(err.partial.get("second").is_none());
        assert!(err.partial.get("third").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_original_policy_continues_batch() {
        let log = Arc::new(ProgressLog::default());
        let scheduler = BatchScheduler::new(FakeClient::new(), settings(FailurePolicy::KeepOriginal))
            .with_observer(log.clone());
        let jobs = vec![Job::inline("bad", "FAIL always"), Job::inline("good", "Hello")];

        let output = scheduler.run_batch(jobs, 2).await.unwrap();

        assert_eq!(output.get("bad"), Some("FAIL always"));
        assert_eq!(output.get("good"), Some("你好"));
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].0, "bad");

        let failed_event = log
            .snapshot()
            .into_iter()
            .find(|e| e.error.is_some())
            .unwrap();
        assert!(failed_event.error.unwrap().contains("bad"));
        assert_eq!(log.latest().unwrap().percentage, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_job_yields_exactly_one_result() {
        let scheduler = BatchScheduler::new(
            FakeClient::with_delay(Duration::from_millis(50)),
            settings(FailurePolicy::Abort),
        );
        let jobs: Vec<Job> = (0..40)
            .map(|i| Job::inline(format!("file-{i}.txt"), format!("Hello {}", "x".repeat(i))))
            .collect();

        let output = scheduler.run_batch(jobs, 4).await.unwrap();

        assert_eq!(output.len(), 40);
        for i in 0..40 {
            let expected = format!("你好 {}", "x".repeat(i));
            assert_eq!(output.get(&format!("file-{i}.txt")), Some(expected.as_str()));
        }
        assert_eq!(scheduler.client.calls.load(Ordering::SeqCst), 40);
        assert!(scheduler.client.peak_in_flight.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_blank_jobs_skip_the_client() {
        let scheduler = BatchScheduler::new(FakeClient::new(), settings(FailurePolicy::Abort));
        let jobs = vec![Job::inline("empty", ""), Job::inline("spaces", "  \n ")];

        let output = scheduler.run_batch(jobs, 2).await.unwrap();

        assert_eq!(output.get("empty"), Some(""));
        assert_eq!(output.get("spaces"), Some("  \n "));
        assert_eq!(scheduler.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_rejected() {
        let err = mock_scheduler()
            .run_batch(vec![Job::inline("a", "Hello"), Job::inline("a", "Hi")], 2)
            .await
            .unwrap_err();

        assert!(matches!(err.source, TranslationError::InputValidation { .. }));
        assert!(err.partial.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let err = mock_scheduler()
            .run_batch(vec![Job::inline("a", "Hello")], 0)
            .await
            .unwrap_err();

        assert!(matches!(err.source, TranslationError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty_output() {
        let output = mock_scheduler().run_batch(Vec::new(), 3).await.unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_returns_partial_results() {
        let scheduler = Arc::new(BatchScheduler::new(
            FakeClient::new(),
            settings(FailurePolicy::Abort),
        ));
        let cancel = CancellationToken::new();
        let jobs = vec![Job::inline("quick", "Hello"), Job::inline("stuck", "FAIL forever")];

        let runner = {
            let scheduler = Arc::clone(&scheduler);
            let cancel = cancel.clone();
            tokio::spawn(async move { scheduler.run_batch_with_cancel(jobs, 2, cancel).await })
        };

        // 第一次退避为2s，在其间取消
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let err = runner.await.unwrap().unwrap_err();
        assert!(matches!(err.source, TranslationError::Cancelled));
        assert!(err.failed.is_none());
        assert_eq!(err.partial.get("quick"), Some("你好"));
        assert!(scheduler.client.calls.load(Ordering::SeqCst) < 5);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_buffered_completions() {
        // 单个工作者：第一个结果进入通道缓冲后，第二个任务在收集端读取前触发取消
        let cancel = CancellationToken::new();
        let scheduler = BatchScheduler::new(
            FakeClient::cancelling(cancel.clone()),
            settings(FailurePolicy::Abort),
        );
        let jobs = vec![
            Job::inline("done", "Hello"),
            Job::inline("trigger", "CANCEL Hello"),
            Job::inline("never", "Hello"),
        ];

        let err = scheduler
            .run_batch_with_cancel(jobs, 1, cancel)
            .await
            .unwrap_err();

        assert!(matches!(err.source, TranslationError::Cancelled));
        assert_eq!(err.partial.get("done"), Some("你好"));
        assert!(err.partial.get("never").is_none());
    }

    #[test]
    fn test_job_from_file_uses_path_as_identifier() {
        let job = Job::from_file("docs/readme.md");
        assert_eq!(job.identifier(), "docs/readme.md");
        assert_eq!(job.source(), &JobSource::File(PathBuf::from("docs/readme.md")));
    }
}
