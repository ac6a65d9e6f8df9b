// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/model/nms.rs - 非极大值抑制与 Top-K 截断
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

use std::cmp::Ordering;

use tracing::debug;

use crate::model::{Annotation, Candidate};

/// 贪心 NMS，结果按置信度降序排列，长度不超过 `max_keep`
///
/// 不区分类别：同一处病害上不同类别的重叠框对显示来说同样是冗余的。
pub fn suppress(
  candidates: Vec<Candidate>,
  iou_threshold: f32,
  score_threshold: f32,
  max_keep: usize,
) -> Vec<Annotation> {
  let mut candidates: Vec<_> = candidates
    .into_iter()
    .filter(|c| c.confidence >= score_threshold)
    .collect();

  // 按置信度降序排列
  candidates.sort_by(|a, b| {
    b.confidence
      .partial_cmp(&a.confidence)
      .unwrap_or(Ordering::Equal)
  });

  let total = candidates.len();
  let mut kept: Vec<Candidate> = Vec::with_capacity(max_keep.min(total));
  for candidate in candidates {
    if kept.len() >= max_keep {
      break;
    }
    if kept
      .iter()
      .all(|best| best.bbox.iou(&candidate.bbox) < iou_threshold)
    {
      kept.push(candidate);
    }
  }

  debug!("NMS: {} 个候选框保留 {} 个", total, kept.len());
  kept.into_iter().map(Annotation::from).collect()
}
