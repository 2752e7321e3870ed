use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use batch_translator::config::{Cli, EngineConfig, EnvSettings};
use batch_translator::scheduler::{BatchOutput, BatchScheduler, Job};
use batch_translator::stats::{format_duration, print_batch_stats, BatchStats};
use batch_translator::translator::TranslationClient;
use batch_translator::utils::{
    collect_dir_files, filter_files_by_types, generate_output_path, init_logging,
    inline_output_path, parse_file_types,
};

/// 已确定输出位置的任务
struct PlannedJob {
    job: Job,
    output_path: PathBuf,
    input_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    let env = EnvSettings::load();
    let config = EngineConfig::from_sources(&cli, &env)?;

    let file_types = match cli.file_types.as_deref() {
        Some(raw) => parse_file_types(raw),
        None => env.file_types.clone(),
    };

    let planned = plan_jobs(&cli, &file_types).await?;
    if planned.is_empty() {
        warn!("无匹配文件");
        return Ok(());
    }

    info!("🚀 开始翻译: {} 个任务", planned.len());
    info!("🌐 目标语言: {}，模型: {}", config.target_lang(), config.model());
    if config.is_mock() {
        info!("🧪 模拟模式，不调用API");
    }

    let client = TranslationClient::new(&config).context("创建翻译客户端失败")?;
    let scheduler = BatchScheduler::new(client, config.batch_settings());
    let jobs: Vec<Job> = planned.iter().map(|p| p.job.clone()).collect();

    let total_start = Instant::now();
    match scheduler.run_batch(jobs, config.concurrency()).await {
        Ok(output) => {
            let total_duration = total_start.elapsed();
            write_outputs(&planned, &output)?;
            info!("✅ 翻译完成！总耗时: {}", format_duration(total_duration));

            if cli.stats || cli.verbose {
                let input_size = planned.iter().map(|p| p.input_size).sum();
                let stats = BatchStats::from_output(planned.len(), &output, input_size, total_duration);
                print_batch_stats(&stats);
            }
        }
        Err(e) => {
            error!("❌ 翻译失败: {}", e);
            if !e.partial.is_empty() {
                let written = write_outputs(&planned, &e.partial)?;
                warn!("已保存 {} 个已完成文件的译文", written);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 根据命令行参数确定任务列表和每个任务的输出路径
async fn plan_jobs(cli: &Cli, file_types: &[String]) -> Result<Vec<PlannedJob>> {
    if let Some(input_dir) = &cli.input_dir {
        let files = collect_dir_files(input_dir, file_types)?;
        info!("递归找到匹配文件: {} 个", files.len());
        return Ok(plan_files(cli, files, Some(input_dir)));
    }

    if !cli.input.is_empty() {
        for path in &cli.input {
            if !path.is_file() {
                anyhow::bail!("输入文件不存在: {}", path.display());
            }
        }
        let files = filter_files_by_types(cli.input.clone(), file_types);
        return Ok(plan_files(cli, files, None));
    }

    let (identifier, text) = if !cli.text.is_empty() {
        ("text", cli.text.join(" "))
    } else {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("读取标准输入失败")?;
        ("stdin", buf)
    };

    if text.trim().is_empty() {
        warn!("警告: 输入为空");
        return Ok(Vec::new());
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| inline_output_path(identifier, &cli.output_dir));
    Ok(vec![PlannedJob {
        input_size: text.len(),
        job: Job::inline(identifier, text),
        output_path,
    }])
}

fn plan_files(cli: &Cli, files: Vec<PathBuf>, input_dir: Option<&Path>) -> Vec<PlannedJob> {
    let single = files.len() == 1;
    let mut seen = HashSet::new();

    files
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .map(|path| {
            let output_path = match (&cli.output, single) {
                (Some(output), true) => output.clone(),
                _ => generate_output_path(&path, input_dir, &cli.output_dir),
            };
            let input_size = std::fs::metadata(&path).map(|m| m.len() as usize).unwrap_or(0);
            PlannedJob {
                job: Job::from_file(&path),
                output_path,
                input_size,
            }
        })
        .collect()
}

/// 写入已有结果，返回写入的文件数
fn write_outputs(planned: &[PlannedJob], output: &BatchOutput) -> Result<usize> {
    let mut written = 0;
    for planned_job in planned {
        let Some(content) = output.get(planned_job.job.identifier()) else {
            continue;
        };
        if let Some(parent) = planned_job.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("创建输出目录失败: {}", parent.display()))?;
            }
        }
        std::fs::write(&planned_job.output_path, content)
            .with_context(|| format!("写入文件失败: {}", planned_job.output_path.display()))?;
        info!("翻译结果已保存到: {}", planned_job.output_path.display());
        written += 1;
    }
    Ok(written)
}
