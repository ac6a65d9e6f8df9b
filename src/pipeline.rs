// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/pipeline.rs - 解码、过滤与抑制流水线
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

use thiserror::Error;
use tracing::debug;

use crate::{
  config::{ConfigError, PipelineConfig},
  frame::FrameSize,
  model::{Annotation, DecodeError, Model, RawOutputTensor, decode, suppress},
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("推理失败: {0}")]
  Inference(Box<dyn std::error::Error + Send + Sync>),
  #[error("解码失败: {0}")]
  Decode(#[from] DecodeError),
}

#[derive(Debug, Clone)]
pub struct Pipeline {
  config: PipelineConfig,
}

impl Pipeline {
  pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// 原始输出 -> 最终检测结果
  pub fn postprocess(
    &self,
    tensors: &[RawOutputTensor],
    frame_width: u32,
    frame_height: u32,
  ) -> Result<Vec<Annotation>, DecodeError> {
    let candidates = decode(tensors, frame_width, frame_height, &self.config)?;
    let annotations = suppress(
      candidates,
      self.config.nms_threshold,
      self.config.nms_score_threshold(),
      self.config.max_detections,
    );
    debug!("本帧检测结果: {:?}", annotations);
    Ok(annotations)
  }

  /// 在当前帧上执行推理并后处理
  pub fn recompute<M>(&self, model: &M, frame: &M::Input) -> Result<Vec<Annotation>, PipelineError>
  where
    M: Model,
    M::Input: FrameSize,
    M::Error: std::error::Error + Send + Sync + 'static,
  {
    let tensors = model
      .infer(frame)
      .map_err(|e| PipelineError::Inference(Box::new(e)))?;
    let annotations = self.postprocess(&tensors, frame.width(), frame.height())?;
    Ok(annotations)
  }
}
