//! 进度上报模块
//!
//! 根据完成计数计算百分比和状态消息，并推送给可选的观察者。
//! 未挂载观察者时不会构造任何事件。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::api_constants::progress_config;

/// 单条进度事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    /// 完成百分比，保留一位小数
    pub percentage: f64,
    pub message: String,
    /// 本次完成的任务若被降级或失败，附带原因
    pub error: Option<String>,
    pub emitted_at: DateTime<Utc>,
}

/// 进度事件的消费者（UI、日志、队列等）
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// 推送模式：把事件转发到无界通道
impl ProgressObserver for mpsc::UnboundedSender<ProgressEvent> {
    fn on_progress(&self, event: &ProgressEvent) {
        // 接收端已关闭时丢弃即可
        let _ = self.send(event.clone());
    }
}

/// 计算完成百分比，保留一位小数
pub fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let raw = completed.min(total) as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// 格式化进度消息
pub fn progress_message(completed: usize, total: usize) -> String {
    format!(
        "进度: {}/{} 文件完成 ({:.1}%)",
        completed,
        total,
        percentage(completed, total)
    )
}

/// 把百分比转换为 0.0..=1.0 的进度条比例
pub fn progress_to_fraction(progress: Option<f64>) -> Option<f64> {
    progress.map(|p| (p / 100.0).clamp(0.0, 1.0))
}

/// 批次进度上报器
///
/// 由调度器的收集端独占，计数只增不减且不会超过总数。
/// 仅当总数大于1时才输出增量进度。
pub struct ProgressReporter {
    total: usize,
    completed: usize,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ProgressReporter {
    pub fn new(total: usize, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        Self {
            total,
            completed: 0,
            observer,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 记录一个任务完成，返回推送给观察者的事件（如果有）
    pub fn job_completed(&mut self, error: Option<String>) -> Option<ProgressEvent> {
        if self.completed < self.total {
            self.completed += 1;
        }

        if self.total <= 1 {
            return None;
        }

        let message = progress_message(self.completed, self.total);
        info!("{}", message);

        let observer = self.observer.as_ref()?;
        let event = ProgressEvent {
            completed: self.completed,
            total: self.total,
            percentage: percentage(self.completed, self.total),
            message,
            error,
            emitted_at: Utc::now(),
        };
        observer.on_progress(&event);
        Some(event)
    }
}

/// 有界的只追加事件队列，超出容量时丢弃最旧的事件
pub struct ProgressLog {
    capacity: usize,
    events: Mutex<VecDeque<ProgressEvent>>,
}

impl ProgressLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// 当前保留的全部事件，按发生顺序
    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<ProgressEvent> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ProgressEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new(progress_config::DEFAULT_QUEUE_CAPACITY)
    }
}

impl ProgressObserver for ProgressLog {
    fn on_progress(&self, event: &ProgressEvent) {
        let mut events = self.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// 只保存最新状态的单槽位，供轮询方读取
#[derive(Default)]
pub struct LatestProgress {
    slot: Mutex<Option<ProgressEvent>>,
}

impl LatestProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<ProgressEvent> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressObserver for LatestProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(event.clone());
    }
}
