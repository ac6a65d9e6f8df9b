// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/cache.rs - 跨帧复用检测结果
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

use std::fmt::Display;

use tracing::{debug, warn};

use crate::model::Annotation;

/// 单帧处理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
  /// 非推理帧，沿用上一次的结果
  Reused,
  /// 推理成功，结果已替换
  Recomputed,
  /// 推理失败，保留上一次的结果
  Failed,
}

/// 保存最近一次推理的结果，每 `infer_every` 帧重新计算一次
///
/// 跳过的帧直接返回缓存内容，检测框在画面上持续显示而不是闪烁，
/// 代价是结果最多滞后 `infer_every` 帧。
#[derive(Debug)]
pub struct TemporalCache {
  last_annotations: Vec<Annotation>,
  frame_counter: u64,
  infer_every: u64,
}

impl TemporalCache {
  pub fn new(infer_every: u64) -> Self {
    Self {
      last_annotations: Vec::new(),
      frame_counter: 0,
      infer_every: infer_every.max(1),
    }
  }

  pub fn frame_counter(&self) -> u64 {
    self.frame_counter
  }

  pub fn annotations(&self) -> &[Annotation] {
    &self.last_annotations
  }

  /// 处理一帧：计数加一，到达推理帧时调用 `recompute`
  pub fn step<F, E>(&mut self, recompute: F) -> (StepOutcome, &[Annotation])
  where
    F: FnOnce() -> Result<Vec<Annotation>, E>,
    E: Display,
  {
    self.frame_counter = self.frame_counter.wrapping_add(1);

    let outcome = if self.frame_counter % self.infer_every == 0 {
      match recompute() {
        Ok(annotations) => {
          debug!(
            "第 {} 帧重新计算, 得到 {} 个检测结果",
            self.frame_counter,
            annotations.len()
          );
          self.last_annotations = annotations;
          StepOutcome::Recomputed
        }
        Err(e) => {
          warn!("第 {} 帧推理失败, 沿用上一次结果: {}", self.frame_counter, e);
          StepOutcome::Failed
        }
      }
    } else {
      StepOutcome::Reused
    };

    (outcome, &self.last_annotations)
  }
}
