// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/model/decode.rs - 原始输出张量解码
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

use ndarray::{ArrayView1, ArrayView2, Axis, Ix2, s};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
  config::PipelineConfig,
  label::RoadLabel,
  model::{BBox, Candidate, Filter, RawOutputTensor},
};

/// 每个候选框的坐标属性个数 (cx, cy, w, h)
const BOX_ATTRS: usize = 4;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("无法识别的张量形状: {0:?}")]
  MalformedShape(Vec<usize>),
  #[error("每个候选框至少需要 5 个属性, 实际为 {0}")]
  TooFewAttributes(usize),
  #[error("无效的画面尺寸: {0}x{1}")]
  InvalidFrameSize(u32, u32),
}

/// 把模型输出解码为候选框列表，置信度与尺寸过滤在解码时一并完成
pub fn decode(
  tensors: &[RawOutputTensor],
  frame_width: u32,
  frame_height: u32,
  config: &PipelineConfig,
) -> Result<Vec<Candidate>, DecodeError> {
  if frame_width == 0 || frame_height == 0 {
    return Err(DecodeError::InvalidFrameSize(frame_width, frame_height));
  }

  let filter = Filter::new(config, frame_width, frame_height);
  let scale_x = frame_width as f32 / config.input_size as f32;
  let scale_y = frame_height as f32 / config.input_size as f32;
  let (fw, fh) = (frame_width as f32, frame_height as f32);

  let mut candidates = Vec::new();
  for (idx, tensor) in tensors.iter().enumerate() {
    let rows = normalize_layout(tensor)?;
    debug!("输出 {}: 形状 {:?}, 候选数 {}", idx, tensor.shape(), rows.nrows());

    for row in rows.outer_iter() {
      let Some((label, confidence)) = best_class(&row) else {
        continue;
      };

      // 无关类别直接丢弃，避免后续无谓的计算
      if !label.is_wanted() {
        continue;
      }
      if !filter.accepts_confidence(label, confidence) {
        continue;
      }

      let (cx, cy, bw, bh) = (row[0], row[1], row[2], row[3]);
      if !(cx.is_finite() && cy.is_finite() && bw.is_finite() && bh.is_finite()) {
        trace!("丢弃坐标无效的候选框: {:?}", row);
        continue;
      }

      // 模型输入是整帧缩放成的正方形，横纵两个方向分别还原；坐标取整到像素
      let x = (((cx - bw / 2.0) * scale_x).trunc()).max(0.0);
      let y = (((cy - bh / 2.0) * scale_y).trunc()).max(0.0);
      let w = (bw * scale_x).trunc().min(fw - x);
      let h = (bh * scale_y).trunc().min(fh - y);

      if w <= 0.0 || h <= 0.0 {
        trace!("丢弃退化的检测框: ({}, {}, {}, {})", x, y, w, h);
        continue;
      }

      let bbox = BBox::new(x, y, w, h);
      if !filter.accepts_size(&bbox) {
        continue;
      }

      candidates.push(Candidate {
        bbox,
        confidence,
        label,
      });
    }
  }

  debug!("解码得到 {} 个候选框", candidates.len());
  Ok(candidates)
}

/// 去掉批次维度，并把候选框放到外层轴
///
/// 三维张量只取第一个批次。候选数通常远大于属性数，因此较短的轴被视为属性轴。
/// 两轴等长时无法判断，按候选框在外层处理。
fn normalize_layout(tensor: &RawOutputTensor) -> Result<ArrayView2<'_, f32>, DecodeError> {
  let shape = tensor.shape().to_vec();
  let view = match tensor.ndim() {
    2 => tensor.view(),
    3 if shape[0] > 0 => {
      if shape[0] > 1 {
        debug!("批次数为 {}, 只解码第一个批次", shape[0]);
      }
      tensor.index_axis(Axis(0), 0)
    }
    _ => return Err(DecodeError::MalformedShape(shape)),
  };
  let view = view
    .into_dimensionality::<Ix2>()
    .map_err(|_| DecodeError::MalformedShape(shape.clone()))?;

  // 没有候选框时不再检查属性轴
  if view.nrows() == 0 {
    return Ok(view);
  }

  let (rows, cols) = view.dim();
  let view = if rows < cols {
    trace!("转置输出张量: {}x{} -> {}x{}", rows, cols, cols, rows);
    view.reversed_axes()
  } else {
    if rows == cols {
      warn!("输出张量为方阵 {}x{}, 无法判断轴方向, 按候选框在外层处理", rows, cols);
    }
    view
  };

  if view.ncols() <= BOX_ATTRS {
    return Err(DecodeError::TooFewAttributes(view.ncols()));
  }
  Ok(view)
}

/// 取分数最高的类别，超出类别表的分数列被忽略
fn best_class(row: &ArrayView1<f32>) -> Option<(RoadLabel, f32)> {
  if row.len() <= BOX_ATTRS {
    return None;
  }
  let end = row.len().min(BOX_ATTRS + RoadLabel::COUNT);
  let scores = row.slice(s![BOX_ATTRS..end]);

  let mut best: Option<(usize, f32)> = None;
  for (class_id, &score) in scores.iter().enumerate() {
    if score.is_nan() {
      continue;
    }
    match best {
      Some((_, best_score)) if score <= best_score => {}
      _ => best = Some((class_id, score)),
    }
  }

  let (class_id, confidence) = best?;
  let label = RoadLabel::try_from(class_id).ok()?;
  Some((label, confidence))
}
