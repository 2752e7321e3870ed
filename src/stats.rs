use std::time::Duration;

use crate::scheduler::BatchOutput;

/// 批次统计结构
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    pub total_jobs: usize,
    pub translated: usize,
    pub degraded: usize,
    pub failed: usize,
    pub input_size: usize,
    pub output_size: usize,
    pub elapsed: Duration,
}

impl BatchStats {
    /// 根据批次输出汇总统计，`input_size` 由调用方提供（引擎不保留原文）
    pub fn from_output(total_jobs: usize, output: &BatchOutput, input_size: usize, elapsed: Duration) -> Self {
        let degraded = output.warnings.len();
        let failed = output.errors.len();
        Self {
            total_jobs,
            translated: output.results.len().saturating_sub(degraded + failed),
            degraded,
            failed,
            input_size,
            output_size: output.results.values().map(String::len).sum(),
            elapsed,
        }
    }
}

impl BatchStats {
    /// 平均每个任务的耗时，没有任务时为空
    pub fn average_per_job(&self) -> Option<Duration> {
        if self.total_jobs == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            self.elapsed.as_secs_f64() / self.total_jobs as f64,
        ))
    }
}

/// 打印批次统计
pub fn print_batch_stats(stats: &BatchStats) {
    println!("\n📊 批量翻译统计报告:");
    println!("═══════════════════════════════════════");

    println!("📁 任务统计:");
    println!("   任务总数: {} 个", stats.total_jobs);
    println!("   翻译成功: {} 个", stats.translated);
    println!("   降级为原文: {} 个", stats.degraded);
    println!("   翻译失败(保留原文): {} 个", stats.failed);

    println!("\n📏 内容统计:");
    println!(
        "   输入大小: {} 字节 ({:.1} KB)",
        stats.input_size,
        stats.input_size as f64 / 1024.0
    );
    println!(
        "   输出大小: {} 字节 ({:.1} KB)",
        stats.output_size,
        stats.output_size as f64 / 1024.0
    );

    println!("\n⏱️  总耗时: {}", format_duration(stats.elapsed));
    if let Some(average) = stats.average_per_job() {
        println!("   平均每个任务: {}", format_duration(average));
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
