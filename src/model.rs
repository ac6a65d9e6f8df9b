// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/model.rs - 模型与检测结果
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

use ndarray::ArrayD;
use serde::Serialize;

use crate::label::RoadLabel;

/// 模型的一个原始输出张量
///
/// 一个轴对应候选框，另一个轴对应 `[cx, cy, w, h, score_0, ..]`，
/// 可带一个长度为 1 的批次维度，两轴顺序不固定。
pub type RawOutputTensor = ArrayD<f32>;

/// 推理后端
pub trait Model {
  type Input;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Vec<RawOutputTensor>, Self::Error>;
}

/// 以像素为单位的检测框，(x, y) 为左上角
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl BBox {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  pub fn iou(&self, other: &BBox) -> f32 {
    let x1 = self.x.max(other.x);
    let y1 = self.y.max(other.y);
    let x2 = (self.x + self.width).min(other.x + other.width);
    let y2 = (self.y + self.height).min(other.y + other.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = self.area() + other.area() - intersection;

    if union > 0.0 {
      intersection / union
    } else {
      0.0
    }
  }
}

/// 解码后、抑制前的候选检测
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  pub bbox: BBox,
  pub confidence: f32,
  pub label: RoadLabel,
}

/// 最终交给渲染端的检测结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
  pub bbox: BBox,
  pub class_name: String,
  pub confidence: f32,
  #[serde(skip)]
  pub label: RoadLabel,
}

impl From<Candidate> for Annotation {
  fn from(candidate: Candidate) -> Self {
    Self {
      bbox: candidate.bbox,
      class_name: candidate.label.as_str().to_string(),
      confidence: candidate.confidence,
      label: candidate.label,
    }
  }
}

pub mod decode;
pub mod filter;
pub mod nms;
#[cfg(feature = "replay_input")]
mod replay;

pub use self::decode::{DecodeError, decode};
pub use self::filter::Filter;
pub use self::nms::suppress;
#[cfg(feature = "replay_input")]
pub use self::replay::{RecordedOutputs, ReplayError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_iou() {
    let a = BBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BBox::new(5.0, 0.0, 10.0, 10.0);
    assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
    assert_eq!(a.iou(&a), 1.0);
    assert_eq!(a.iou(&BBox::new(20.0, 20.0, 5.0, 5.0)), 0.0);
    assert_eq!(
      BBox::new(0.0, 0.0, 0.0, 0.0).iou(&BBox::new(0.0, 0.0, 0.0, 0.0)),
      0.0
    );
  }

  #[test]
  fn test_annotation_from_candidate() {
    let annotation = Annotation::from(Candidate {
      bbox: BBox::new(1.0, 2.0, 3.0, 4.0),
      confidence: 0.8,
      label: RoadLabel::Pothole,
    });
    assert_eq!(annotation.class_name, "pothole");
    assert_eq!(annotation.label, RoadLabel::Pothole);
  }
}
