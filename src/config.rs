// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/config.rs - 后处理流水线配置
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

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::label::RoadLabel;

const DEFAULT_INPUT_SIZE: u32 = 320;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.65;
const DEFAULT_POTHOLE_THRESHOLD: f32 = 0.45;
const DEFAULT_NMS_THRESHOLD: f32 = 0.30;
const DEFAULT_MAX_DETECTIONS: usize = 5;
const DEFAULT_MAX_BOX_RATIO: f32 = 0.55;
const DEFAULT_INFER_EVERY: u64 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件解析错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("配置项 {name} 无效: {reason}")]
  Invalid { name: String, reason: String },
}

impl ConfigError {
  fn invalid(name: &str, reason: impl Into<String>) -> Self {
    ConfigError::Invalid {
      name: name.to_string(),
      reason: reason.into(),
    }
  }
}

/// 流水线参数，启动时加载一次，之后不再修改
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// 模型输入的正方形边长
  pub input_size: u32,
  /// 默认置信度阈值
  pub confidence_threshold: f32,
  /// 按类别覆盖的置信度阈值
  pub class_thresholds: HashMap<RoadLabel, f32>,
  /// NMS IoU 阈值
  pub nms_threshold: f32,
  /// 每次推理最多保留的检测数
  pub max_detections: usize,
  /// 检测框宽或高占画面比例的上限
  pub max_box_ratio: f32,
  /// 每隔多少帧推理一次
  pub infer_every: u64,
  /// 为真时 NMS 使用默认阈值作为分数门限（会抵消类别覆盖阈值）
  pub strict_nms_score: bool,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      input_size: DEFAULT_INPUT_SIZE,
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      class_thresholds: HashMap::from([(RoadLabel::Pothole, DEFAULT_POTHOLE_THRESHOLD)]),
      nms_threshold: DEFAULT_NMS_THRESHOLD,
      max_detections: DEFAULT_MAX_DETECTIONS,
      max_box_ratio: DEFAULT_MAX_BOX_RATIO,
      infer_every: DEFAULT_INFER_EVERY,
      strict_nms_score: false,
    }
  }
}

impl PipelineConfig {
  pub fn from_file<P>(file_path: P) -> Result<Self, ConfigError>
  where
    P: AsRef<Path> + std::fmt::Debug,
  {
    info!("读取配置文件: {:?}", file_path);
    let content = fs::read_to_string(&file_path).map_err(|e| {
      error!("配置文件读取失败: {e}");
      e
    })?;
    Self::from_toml_str(&content)
  }

  pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(content).map_err(|e| {
      error!("配置文件解析失败: {e}");
      e
    })?;
    config.validate()?;
    debug!("配置加载完成: {:?}", config);
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.input_size == 0 {
      return Err(ConfigError::invalid("input_size", "必须大于 0"));
    }
    if self.infer_every == 0 {
      return Err(ConfigError::invalid("infer_every", "必须大于 0"));
    }
    check_unit_interval("confidence_threshold", self.confidence_threshold)?;
    check_unit_interval("nms_threshold", self.nms_threshold)?;
    for (label, threshold) in &self.class_thresholds {
      check_unit_interval(&format!("class_thresholds.{label}"), *threshold)?;
    }
    if !(self.max_box_ratio > 0.0 && self.max_box_ratio <= 1.0) {
      return Err(ConfigError::invalid(
        "max_box_ratio",
        format!("必须在 (0, 1] 之间, 实际为 {}", self.max_box_ratio),
      ));
    }
    Ok(())
  }

  /// 指定类别生效的置信度阈值
  pub fn threshold_for(&self, label: RoadLabel) -> f32 {
    self
      .class_thresholds
      .get(&label)
      .copied()
      .unwrap_or(self.confidence_threshold)
  }

  /// 交给 NMS 的分数门限
  pub fn nms_score_threshold(&self) -> f32 {
    if self.strict_nms_score {
      return self.confidence_threshold;
    }
    self
      .class_thresholds
      .values()
      .copied()
      .fold(self.confidence_threshold, f32::min)
  }
}

fn check_unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(ConfigError::invalid(
      name,
      format!("必须在 [0, 1] 之间, 实际为 {value}"),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_values() {
    let config = PipelineConfig::default();
    assert_eq!(config.input_size, 320);
    assert_eq!(config.max_detections, 5);
    assert_eq!(config.infer_every, 3);
    assert_eq!(config.threshold_for(RoadLabel::Pothole), 0.45);
    assert_eq!(config.threshold_for(RoadLabel::TransverseCrack), 0.65);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_partial_toml_keeps_defaults() {
    let config = PipelineConfig::from_toml_str(
      r#"
        input_size = 640
        infer_every = 1

        [class_thresholds]
        alligator_crack = 0.5
      "#,
    )
    .unwrap();
    assert_eq!(config.input_size, 640);
    assert_eq!(config.infer_every, 1);
    assert_eq!(config.nms_threshold, 0.30);
    assert_eq!(config.threshold_for(RoadLabel::AlligatorCrack), 0.5);
    // 显式给出的表会替换默认的坑槽覆盖
    assert_eq!(config.threshold_for(RoadLabel::Pothole), 0.65);
  }

  #[test]
  fn test_invalid_values_are_rejected() {
    assert!(matches!(
      PipelineConfig::from_toml_str("infer_every = 0"),
      Err(ConfigError::Invalid { .. })
    ));
    assert!(matches!(
      PipelineConfig::from_toml_str("max_box_ratio = 1.5"),
      Err(ConfigError::Invalid { .. })
    ));
    assert!(matches!(
      PipelineConfig::from_toml_str("[class_thresholds]\npothole = -0.1"),
      Err(ConfigError::Invalid { .. })
    ));
    assert!(matches!(
      PipelineConfig::from_toml_str("input_size = \"big\""),
      Err(ConfigError::ParseError(_))
    ));
  }

  #[test]
  fn test_nms_score_threshold() {
    let mut config = PipelineConfig::default();
    assert_eq!(config.nms_score_threshold(), 0.45);
    config.strict_nms_score = true;
    assert_eq!(config.nms_score_threshold(), 0.65);
  }

  #[test]
  fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lumian.toml");
    std::fs::write(&path, "max_detections = 2\n").unwrap();
    let config = PipelineConfig::from_file(&path).unwrap();
    assert_eq!(config.max_detections, 2);

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
      PipelineConfig::from_file(&missing),
      Err(ConfigError::IoError(_))
    ));
  }
}
