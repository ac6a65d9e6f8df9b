// 该文件是 Lumian （路面巡检） 项目的一部分。
// tests/properties.rs - 后处理性质测试
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

use lumian::{
  config::PipelineConfig,
  label::RoadLabel,
  model::{Annotation, Candidate, RawOutputTensor, decode, suppress},
  pipeline::Pipeline,
};
use ndarray::Array2;
use proptest::prelude::*;

const N_ATTRS: usize = 4 + RoadLabel::COUNT;

/// 一个候选框：坐标覆盖 320 输入画面之外的区域，类别分数在 [0, 1)
fn candidate_row() -> impl Strategy<Value = Vec<f32>> {
  (
    -32.0f32..352.0,
    -32.0f32..352.0,
    0.0f32..256.0,
    0.0f32..256.0,
    prop::collection::vec(0.0f32..1.0, RoadLabel::COUNT),
  )
    .prop_map(|(cx, cy, w, h, scores)| {
      let mut row = vec![cx, cy, w, h];
      row.extend(scores);
      row
    })
}

/// [candidates, attrs] 布局的输出，候选数总是多于属性数
fn raw_output() -> impl Strategy<Value = RawOutputTensor> {
  prop::collection::vec(candidate_row(), N_ATTRS + 1..200).prop_map(|rows| {
    let n = rows.len();
    let data: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, N_ATTRS), data)
      .unwrap()
      .into_dyn()
  })
}

fn frame_size() -> impl Strategy<Value = (u32, u32)> {
  (16u32..2000, 16u32..2000)
}

fn to_candidates(annotations: &[Annotation]) -> Vec<Candidate> {
  annotations
    .iter()
    .map(|a| Candidate {
      bbox: a.bbox,
      confidence: a.confidence,
      label: a.label,
    })
    .collect()
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn emitted_annotations_hold_invariants(tensor in raw_output(), (fw, fh) in frame_size()) {
    let config = PipelineConfig::default();
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let annotations = pipeline.postprocess(&[tensor], fw, fh).unwrap();

    prop_assert!(annotations.len() <= config.max_detections);
    for pair in annotations.windows(2) {
      prop_assert!(pair[0].confidence >= pair[1].confidence);
    }
    for a in &annotations {
      let label = a.label;
      prop_assert!(label.is_wanted());
      prop_assert_eq!(a.class_name.as_str(), label.as_str());
      prop_assert!(a.confidence >= config.threshold_for(label));
      prop_assert!(a.bbox.x >= 0.0 && a.bbox.y >= 0.0);
      prop_assert!(a.bbox.width > 0.0 && a.bbox.height > 0.0);
      prop_assert!(a.bbox.x + a.bbox.width <= fw as f32);
      prop_assert!(a.bbox.y + a.bbox.height <= fh as f32);
      prop_assert!(a.bbox.width / fw as f32 <= config.max_box_ratio);
      prop_assert!(a.bbox.height / fh as f32 <= config.max_box_ratio);
    }
  }

  #[test]
  fn raising_threshold_never_grows_candidates(
    tensor in raw_output(),
    (fw, fh) in frame_size(),
    a in 0.0f32..1.0,
    b in 0.0f32..1.0
  ) {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let count = |threshold: f32| {
      let config = PipelineConfig {
        confidence_threshold: threshold,
        class_thresholds: [(RoadLabel::Pothole, threshold)].into_iter().collect(),
        ..Default::default()
      };
      decode(std::slice::from_ref(&tensor), fw, fh, &config)
        .unwrap()
        .len()
    };
    prop_assert!(count(high) <= count(low));
  }

  #[test]
  fn suppression_is_idempotent(
    tensor in raw_output(),
    (fw, fh) in frame_size(),
    iou_threshold in 0.05f32..0.95
  ) {
    let config = PipelineConfig::default();
    let candidates = decode(&[tensor], fw, fh, &config).unwrap();
    let once = suppress(candidates, iou_threshold, 0.0, usize::MAX);
    let twice = suppress(to_candidates(&once), iou_threshold, 0.0, usize::MAX);
    prop_assert_eq!(once, twice);
  }

  #[test]
  fn top_k_is_prefix_of_full_suppression(
    tensor in raw_output(),
    (fw, fh) in frame_size(),
    max_keep in 0usize..10
  ) {
    let config = PipelineConfig::default();
    let candidates = decode(&[tensor], fw, fh, &config).unwrap();
    let full = suppress(candidates.clone(), config.nms_threshold, 0.0, usize::MAX);
    let limited = suppress(candidates, config.nms_threshold, 0.0, max_keep);

    prop_assert_eq!(limited.len(), full.len().min(max_keep));
    prop_assert_eq!(&limited[..], &full[..limited.len()]);
  }
}

#[test]
fn pothole_override_survives_pipeline() {
  let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
  let mut output = Array2::<f32>::zeros((N_ATTRS + 1, N_ATTRS));
  output[[0, 0]] = 160.0;
  output[[0, 1]] = 160.0;
  output[[0, 2]] = 32.0;
  output[[0, 3]] = 32.0;
  output[[0, 4 + RoadLabel::Pothole.id()]] = 0.50;

  let annotations = pipeline
    .postprocess(&[output.into_dyn()], 1280, 720)
    .unwrap();
  assert_eq!(annotations.len(), 1);
  assert_eq!(annotations[0].class_name, "pothole");
  assert_eq!(annotations[0].confidence, 0.50);
}
