// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/output.rs - 输出定义
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
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::FrameSize, model::Annotation};

/// 渲染端，每帧收到一次当前的显示结果
pub trait Render<Frame>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, annotations: &[Annotation]) -> Result<(), Self::Error>;
}

#[cfg(feature = "draw")]
pub mod draw;
#[cfg(feature = "draw")]
mod image_output;
#[cfg(feature = "draw")]
pub use self::image_output::{ImageDirectoryOutput, ImageDirectoryOutputError};

mod log_output;
pub use self::log_output::{LogOutput, LogOutputError};

#[cfg(feature = "jsonl_output")]
mod jsonl_output;
#[cfg(feature = "jsonl_output")]
pub use self::jsonl_output::{JsonLinesOutput, JsonLinesOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("日志输出错误: {0}")]
  LogOutputError(#[from] LogOutputError),
  #[cfg(feature = "jsonl_output")]
  #[error("JSON 行输出错误: {0}")]
  JsonLinesOutputError(#[from] JsonLinesOutputError),
  #[cfg(feature = "draw")]
  #[error("图像输出错误: {0}")]
  ImageDirectoryOutputError(#[from] ImageDirectoryOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Log(LogOutput),
  #[cfg(feature = "jsonl_output")]
  JsonLines(JsonLinesOutput),
  #[cfg(feature = "draw")]
  ImageDirectory(ImageDirectoryOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      LogOutput::SCHEME => Ok(OutputWrapper::Log(LogOutput::from_url(url)?)),
      #[cfg(feature = "jsonl_output")]
      JsonLinesOutput::SCHEME => Ok(OutputWrapper::JsonLines(JsonLinesOutput::from_url(url)?)),
      #[cfg(feature = "draw")]
      ImageDirectoryOutput::SCHEME => Ok(OutputWrapper::ImageDirectory(
        ImageDirectoryOutput::from_url(url)?,
      )),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl<F: FrameSize> Render<F> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &F, annotations: &[Annotation]) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Log(output) => output
        .render_result(frame, annotations)
        .map_err(OutputError::from),
      #[cfg(feature = "jsonl_output")]
      OutputWrapper::JsonLines(output) => output
        .render_result(frame, annotations)
        .map_err(OutputError::from),
      #[cfg(feature = "draw")]
      OutputWrapper::ImageDirectory(output) => output
        .render_result(frame, annotations)
        .map_err(OutputError::from),
    }
  }
}
