// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/frame.rs - 帧定义
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

use crate::model::RawOutputTensor;

/// 帧的原始分辨率
pub trait FrameSize {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
}

/// 预先录制的一帧：画面尺寸和当时的模型输出
#[derive(Debug, Clone)]
pub struct RecordedFrame {
  pub index: u64,
  pub width: u32,
  pub height: u32,
  pub outputs: Vec<RawOutputTensor>,
  /// 录制时推理后端报告的错误
  pub error: Option<String>,
}

impl FrameSize for RecordedFrame {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }
}
