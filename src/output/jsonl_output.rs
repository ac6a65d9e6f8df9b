// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/output/jsonl_output.rs - JSON 行记录输出
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
  io::{BufWriter, Write},
  sync::Mutex,
};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::FrameSize, model::Annotation, output::Render};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("输出文件锁已损坏")]
  Poisoned,
}

#[derive(Serialize)]
struct FrameLine<'a> {
  frame: u64,
  timestamp: String,
  width: u32,
  height: u32,
  count: usize,
  annotations: &'a [Annotation],
}

struct Writer {
  file: BufWriter<File>,
  frame: u64,
}

/// 每帧写一行 JSON，记录当时显示的检测结果
pub struct JsonLinesOutput {
  writer: Mutex<Writer>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    info!("创建输出文件: {}", uri.path());
    let file = File::create(uri.path())?;
    Ok(JsonLinesOutput {
      writer: Mutex::new(Writer {
        file: BufWriter::new(file),
        frame: 0,
      }),
    })
  }
}

impl<F: FrameSize> Render<F> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, frame: &F, annotations: &[Annotation]) -> Result<(), Self::Error> {
    let mut writer = self
      .writer
      .lock()
      .map_err(|_| JsonLinesOutputError::Poisoned)?;
    writer.frame += 1;

    let line = FrameLine {
      frame: writer.frame,
      timestamp: Utc::now().to_rfc3339(),
      width: frame.width(),
      height: frame.height(),
      count: annotations.len(),
      annotations,
    };
    serde_json::to_writer(&mut writer.file, &line)?;
    writer.file.write_all(b"\n")?;
    writer.file.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{frame::RecordedFrame, label::RoadLabel, model::BBox};

  #[test]
  fn test_write_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    let url = Url::parse(&format!("jsonl://{}", path.display())).unwrap();
    let output = JsonLinesOutput::from_url(&url).unwrap();

    let frame = RecordedFrame {
      index: 1,
      width: 640,
      height: 480,
      outputs: Vec::new(),
      error: None,
    };
    let annotation = Annotation {
      bbox: BBox::new(1.0, 2.0, 30.0, 40.0),
      class_name: "pothole".to_string(),
      confidence: 0.5,
      label: RoadLabel::Pothole,
    };
    output.render_result(&frame, &[]).unwrap();
    output.render_result(&frame, &[annotation]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
      .lines()
      .map(|l| serde_json::from_str(l).unwrap())
      .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["count"], 0);
    assert_eq!(lines[1]["frame"], 2);
    assert_eq!(lines[1]["annotations"][0]["class_name"], "pothole");
    assert_eq!(lines[1]["annotations"][0]["bbox"]["width"], 30.0);
  }
}
