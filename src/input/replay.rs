// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/input/replay.rs - 录制输出回放输入
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

use std::{
  fs::File,
  io::{BufRead, BufReader, Lines},
};

use ndarray::{ArrayD, IxDyn};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RecordedFrame};

#[derive(Error, Debug)]
pub enum ReplayInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// JSON 行格式的一帧记录
#[derive(Debug, Deserialize)]
struct FrameRecord {
  width: u32,
  height: u32,
  #[serde(default)]
  outputs: Vec<TensorRecord>,
  #[serde(default)]
  error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TensorRecord {
  shape: Vec<usize>,
  data: Vec<f32>,
}

/// 解析一行记录
///
/// 张量形状与数据长度不一致时不视为解析失败，而是把这一帧标记为推理失败，
/// 由下游按跳帧处理。
pub fn parse_record(line: &str, index: u64) -> Result<RecordedFrame, ReplayInputError> {
  let record: FrameRecord = serde_json::from_str(line)?;

  let mut error = record.error;
  let mut outputs = Vec::with_capacity(record.outputs.len());
  for (i, tensor) in record.outputs.into_iter().enumerate() {
    match ArrayD::from_shape_vec(IxDyn(&tensor.shape), tensor.data) {
      Ok(array) => outputs.push(array),
      Err(e) => {
        error!("第 {} 帧第 {} 个输出形状错误: {}", index, i, e);
        error.get_or_insert_with(|| format!("输出 {i} 形状错误: {e}"));
      }
    }
  }

  Ok(RecordedFrame {
    index,
    width: record.width,
    height: record.height,
    outputs,
    error,
  })
}

pub struct ReplayInput {
  lines: Lines<BufReader<File>>,
  index: u64,
}

impl FromUrlWithScheme for ReplayInput {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayInput {
  type Error = ReplayInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayInputError::SchemeMismatch);
    }

    info!("打开回放文件: {}", url.path());
    let file = File::open(url.path())?;
    Ok(ReplayInput {
      lines: BufReader::new(file).lines(),
      index: 0,
    })
  }
}

impl Iterator for ReplayInput {
  type Item = RecordedFrame;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let line = match self.lines.next()? {
        Ok(line) => line,
        Err(e) => {
          error!("读取回放文件失败: {}", e);
          return None;
        }
      };
      if line.trim().is_empty() {
        continue;
      }

      self.index += 1;
      match parse_record(&line, self.index) {
        Ok(frame) => return Some(frame),
        Err(e) => {
          // 丢弃无法解析的行，继续下一帧
          error!("第 {} 帧记录无法解析: {}", self.index, e);
        }
      }
    }
  }
}
