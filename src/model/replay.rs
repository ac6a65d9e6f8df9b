// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/model/replay.rs - 录制输出回放后端
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
  frame::RecordedFrame,
  model::{Model, RawOutputTensor},
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("第 {index} 帧录制的推理错误: {message}")]
  Recorded { index: u64, message: String },
}

/// 直接返回帧中录制的模型输出，用于离线复现
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordedOutputs;

impl Model for RecordedOutputs {
  type Input = RecordedFrame;
  type Error = ReplayError;

  fn infer(&self, input: &Self::Input) -> Result<Vec<RawOutputTensor>, Self::Error> {
    if let Some(message) = &input.error {
      return Err(ReplayError::Recorded {
        index: input.index,
        message: message.clone(),
      });
    }
    debug!("回放第 {} 帧的 {} 个输出", input.index, input.outputs.len());
    Ok(input.outputs.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::ArrayD;

  #[test]
  fn test_recorded_error_is_returned() {
    let frame = RecordedFrame {
      index: 4,
      width: 10,
      height: 10,
      outputs: vec![ArrayD::zeros(vec![2, 2])],
      error: Some("timeout".to_string()),
    };
    let err = RecordedOutputs.infer(&frame).unwrap_err();
    assert!(err.to_string().contains("timeout"));

    let frame = RecordedFrame { error: None, ..frame };
    assert_eq!(RecordedOutputs.infer(&frame).unwrap().len(), 1);
  }
}
