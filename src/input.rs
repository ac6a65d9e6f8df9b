// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/input.rs - 帧输入
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

use crate::{FromUrl, frame::RecordedFrame};
#[cfg(feature = "replay_input")]
use crate::FromUrlWithScheme;

#[cfg(feature = "replay_input")]
mod replay;
#[cfg(feature = "replay_input")]
pub use self::replay::{ReplayInput, ReplayInputError, parse_record};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "replay_input")]
  #[error("回放输入错误: {0}")]
  ReplayInputError(#[from] ReplayInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "replay_input")]
  Replay(ReplayInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "replay_input")]
      ReplayInput::SCHEME => Ok(InputWrapper::Replay(ReplayInput::from_url(url)?)),
      _ => Err(InputError::SchemeMismatch),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = RecordedFrame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "replay_input")]
      InputWrapper::Replay(input) => input.next(),
    }
  }
}
