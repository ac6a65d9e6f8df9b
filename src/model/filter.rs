// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/model/filter.rs - 置信度与几何过滤
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

use tracing::trace;

use crate::{config::PipelineConfig, label::RoadLabel, model::BBox};

/// 解码过程中逐个候选框调用的过滤器
pub struct Filter<'a> {
  config: &'a PipelineConfig,
  frame_width: f32,
  frame_height: f32,
}

impl<'a> Filter<'a> {
  pub fn new(config: &'a PipelineConfig, frame_width: u32, frame_height: u32) -> Self {
    Self {
      config,
      frame_width: frame_width as f32,
      frame_height: frame_height as f32,
    }
  }

  /// 置信度门限，低于该类别阈值的候选框不通过
  pub fn accepts_confidence(&self, label: RoadLabel, confidence: f32) -> bool {
    let threshold = self.config.threshold_for(label);
    if !confidence.is_finite() || confidence < threshold {
      trace!(
        "丢弃 {}: 置信度 {:.3} 低于阈值 {:.3}",
        label, confidence, threshold
      );
      return false;
    }
    true
  }

  /// 尺寸检查，宽或高超过画面比例上限的候选框不通过
  pub fn accepts_size(&self, bbox: &BBox) -> bool {
    let ratio_w = bbox.width / self.frame_width;
    let ratio_h = bbox.height / self.frame_height;
    if ratio_w > self.config.max_box_ratio || ratio_h > self.config.max_box_ratio {
      trace!(
        "丢弃过大的检测框: {:.2} x {:.2} (上限 {:.2})",
        ratio_w, ratio_h, self.config.max_box_ratio
      );
      return false;
    }
    true
  }
}
