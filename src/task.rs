// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/task.rs - 帧处理任务
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

use std::{sync::mpsc, thread, time::Duration};
use tracing::{debug, info, warn};

use crate::{
  cache::{StepOutcome, TemporalCache},
  frame::FrameSize,
  model::Model,
  output::Render,
  pipeline::Pipeline,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧，推理失败直接报错
pub struct OneShotTask {
  pipeline: Pipeline,
}

impl OneShotTask {
  pub fn new(pipeline: Pipeline) -> Self {
    Self { pipeline }
  }
}

impl<
  F: FrameSize,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Error = ME>,
  O: Render<F, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let annotations = self.pipeline.recompute(&model, &frame)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &annotations)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 连续处理帧，每 `infer_every` 帧推理一次，其余帧沿用上一次的结果
#[derive(Debug)]
pub struct ContinuousTask {
  pipeline: Pipeline,
  frame_number: Option<u64>,
  interruptible: bool,
}

impl ContinuousTask {
  pub fn new(pipeline: Pipeline) -> Self {
    Self {
      pipeline,
      frame_number: None,
      interruptible: false,
    }
  }

  pub fn with_frame_number(mut self, frame_number: Option<u64>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 安装 Ctrl-C 处理，收到信号后结束任务循环
  pub fn with_interrupt(mut self, interruptible: bool) -> Self {
    self.interruptible = interruptible;
    self
  }
}

impl<
  F: FrameSize,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Error = ME>,
  O: Render<F, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!(
      "开始任务, 每 {} 帧推理一次...",
      self.pipeline.config().infer_every
    );
    let (tx, rx) = mpsc::channel();

    if self.interruptible {
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
        thread::spawn(|| {
          thread::sleep(Duration::from_secs(30));
          warn!("强制退出程序");
          std::process::exit(1);
        });
      })?;
    } else {
      drop(tx);
    }

    let mut cache = TemporalCache::new(self.pipeline.config().infer_every);
    let (mut recomputed, mut failed) = (0u64, 0u64);
    let mut now = std::time::Instant::now();
    for frame in input {
      let (outcome, annotations) = cache.step(|| self.pipeline.recompute(&model, &frame));
      match outcome {
        StepOutcome::Recomputed => recomputed += 1,
        StepOutcome::Failed => failed += 1,
        StepOutcome::Reused => {}
      }
      let elapsed_a = now.elapsed();
      output.render_result(&frame, annotations)?;
      let elapsed_b = now.elapsed();
      now = std::time::Instant::now();

      let frame_index = cache.frame_counter();
      debug!(
        "第 {} 帧 ({:?}) 完成，耗时: {:.2?} / {:.2?}",
        frame_index, outcome, elapsed_a, elapsed_b
      );
      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!(
      "任务完成，共 {} 帧, 推理 {} 次, 失败 {} 次",
      cache.frame_counter(),
      recomputed,
      failed
    );
    Ok(())
  }
}
