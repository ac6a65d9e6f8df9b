// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/bin/replay.rs - 录制输出回放
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use lumian::{
  FromUrl,
  config::PipelineConfig,
  input::InputWrapper,
  model::RecordedOutputs,
  output::OutputWrapper,
  pipeline::Pipeline,
  task::{ContinuousTask, Task},
};

/// Lumian 回放参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 流水线配置文件（TOML），不指定时使用默认参数
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 输入来源，例如 replay:///path/to/record.jsonl
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 log://、jsonl:///path/to/out.jsonl 或 folder:///path/to/dir
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 最多处理的帧数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<u64>,
  /// 覆盖配置中的推理间隔
  #[arg(long, value_name = "N")]
  pub infer_every: Option<u64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let mut config = match &args.config {
    Some(path) => PipelineConfig::from_file(path)?,
    None => PipelineConfig::default(),
  };
  if let Some(n) = args.infer_every {
    config.infer_every = n;
  }
  info!(
    "输入尺寸: {}px | 每 {} 帧推理一次",
    config.input_size, config.infer_every
  );

  let pipeline = Pipeline::new(config)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  ContinuousTask::new(pipeline)
    .with_frame_number(args.frame_number)
    .with_interrupt(true)
    .run_task(input, RecordedOutputs, output)?;

  Ok(())
}
