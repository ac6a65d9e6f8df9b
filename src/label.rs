// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/label.rs - 路面病害类别表
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

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 模型可输出的全部类别，顺序与模型分类分数的排列一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadLabel {
  LongitudinalCrack,
  TransverseCrack,
  AlligatorCrack,
  Pothole,
  Repair,
  Other,
  Barrier,
  Cone,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("无效的类别编号: {0}")]
pub struct InvalidLabelId(pub usize);

impl RoadLabel {
  /// 类别总数
  pub const COUNT: usize = 8;

  pub const ALL: [RoadLabel; RoadLabel::COUNT] = [
    RoadLabel::LongitudinalCrack,
    RoadLabel::TransverseCrack,
    RoadLabel::AlligatorCrack,
    RoadLabel::Pothole,
    RoadLabel::Repair,
    RoadLabel::Other,
    RoadLabel::Barrier,
    RoadLabel::Cone,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      RoadLabel::LongitudinalCrack => "longitudinal_crack",
      RoadLabel::TransverseCrack => "transverse_crack",
      RoadLabel::AlligatorCrack => "alligator_crack",
      RoadLabel::Pothole => "pothole",
      RoadLabel::Repair => "repair",
      RoadLabel::Other => "other",
      RoadLabel::Barrier => "barrier",
      RoadLabel::Cone => "cone",
    }
  }

  /// 叠加显示用的短名称
  pub fn as_str_short(&self) -> &'static str {
    match self {
      RoadLabel::LongitudinalCrack => "L-crack",
      RoadLabel::TransverseCrack => "T-crack",
      RoadLabel::AlligatorCrack => "Allig",
      RoadLabel::Pothole => "POTHOLE",
      RoadLabel::Repair => "Repair",
      RoadLabel::Other => "Other",
      RoadLabel::Barrier => "Barrier",
      RoadLabel::Cone => "Cone",
    }
  }

  /// 只有裂缝和坑槽会被上报，其余类别在解码阶段直接丢弃
  pub fn is_wanted(&self) -> bool {
    matches!(
      self,
      RoadLabel::LongitudinalCrack
        | RoadLabel::TransverseCrack
        | RoadLabel::AlligatorCrack
        | RoadLabel::Pothole
    )
  }

  /// RGB 颜色
  pub fn color(&self) -> [u8; 3] {
    match self {
      RoadLabel::LongitudinalCrack => [255, 165, 0],
      RoadLabel::TransverseCrack => [0, 220, 0],
      RoadLabel::AlligatorCrack => [80, 80, 255],
      RoadLabel::Pothole => [255, 0, 0],
      _ => [128, 128, 128],
    }
  }

  pub fn id(&self) -> usize {
    *self as usize
  }
}

impl Display for RoadLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl TryFrom<usize> for RoadLabel {
  type Error = InvalidLabelId;

  fn try_from(value: usize) -> Result<Self, Self::Error> {
    RoadLabel::ALL.get(value).copied().ok_or(InvalidLabelId(value))
  }
}
