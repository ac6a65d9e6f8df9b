// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/output/log_output.rs - 日志输出
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
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::FrameSize, model::Annotation, output::Render};

#[derive(Error, Debug)]
pub enum LogOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 把每帧的检测数量和检测框写入日志
pub struct LogOutput {
  /// 没有检测结果的帧也输出
  always: bool,
}

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(LogOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }
    let always = uri.query_pairs().any(|(k, _)| k == "always");
    Ok(LogOutput { always })
  }
}

impl<F: FrameSize> Render<F> for LogOutput {
  type Error = LogOutputError;

  fn render_result(&self, frame: &F, annotations: &[Annotation]) -> Result<(), Self::Error> {
    if annotations.is_empty() && !self.always {
      return Ok(());
    }

    info!(
      "Det: {} ({}x{})",
      annotations.len(),
      frame.width(),
      frame.height()
    );
    for a in annotations {
      debug!(
        "  - {} {:.2} at ({:.0}, {:.0}, {:.0}x{:.0})",
        a.label.as_str_short(),
        a.confidence,
        a.bbox.x,
        a.bbox.y,
        a.bbox.width,
        a.bbox.height
      );
    }
    Ok(())
  }
}
