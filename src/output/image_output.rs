// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/output/image_output.rs - 检测结果图像目录输出
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

use std::{path::PathBuf, sync::Mutex};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::FrameSize,
  model::Annotation,
  output::{
    Render,
    draw::{Draw, DrawError},
  },
};

#[derive(Error, Debug)]
pub enum ImageDirectoryOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("绘制器错误: {0}")]
  DrawError(#[from] DrawError),
  #[error("帧计数锁已损坏")]
  Poisoned,
}

/// 把每帧的检测结果画成 PNG 保存到目录
///
/// 录制帧没有像素数据，画在与原始帧同尺寸的黑色画布上。
/// 默认只保存有检测结果的帧，`?always` 保存所有帧，`?font=<path>` 启用文字。
pub struct ImageDirectoryOutput {
  directory: PathBuf,
  draw: Draw,
  frame_counter: Mutex<u64>,
  always: bool,
}

impl FromUrlWithScheme for ImageDirectoryOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageDirectoryOutput {
  type Error = ImageDirectoryOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ImageDirectoryOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let draw = match uri.query_pairs().find(|(k, _)| k == "font") {
      Some((_, font)) => {
        info!("加载字体: {}", font);
        Draw::with_font_file(font.into_owned())?
      }
      None => Draw::default(),
    };

    let directory = PathBuf::from(uri.path());
    std::fs::create_dir_all(&directory)?;
    info!("图像输出目录: {}", directory.display());

    Ok(ImageDirectoryOutput {
      directory,
      draw,
      frame_counter: Mutex::new(0),
      always,
    })
  }
}

impl ImageDirectoryOutput {
  fn next_frame_id(&self) -> Result<u64, ImageDirectoryOutputError> {
    let mut counter = self
      .frame_counter
      .lock()
      .map_err(|_| ImageDirectoryOutputError::Poisoned)?;
    *counter += 1;
    Ok(*counter)
  }
}

impl<F: FrameSize> Render<F> for ImageDirectoryOutput {
  type Error = ImageDirectoryOutputError;

  fn render_result(&self, frame: &F, annotations: &[Annotation]) -> Result<(), Self::Error> {
    let id = self.next_frame_id()?;
    if !self.always && annotations.is_empty() {
      return Ok(());
    }

    let mut image = RgbImage::new(frame.width(), frame.height());
    self.draw.draw_annotations(&mut image, annotations);

    let path = self.directory.join(format!("{:06}.png", id));
    image.save(&path)?;
    debug!("保存图像到文件: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{frame::RecordedFrame, label::RoadLabel, model::BBox};
  use image::Rgb;

  fn frame() -> RecordedFrame {
    RecordedFrame {
      index: 1,
      width: 120,
      height: 80,
      outputs: Vec::new(),
      error: None,
    }
  }

  fn pothole() -> Annotation {
    Annotation {
      bbox: BBox::new(10.0, 10.0, 40.0, 30.0),
      class_name: "pothole".to_string(),
      confidence: 0.7,
      label: RoadLabel::Pothole,
    }
  }

  #[test]
  fn test_saves_frames_with_detections() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}/shots", dir.path().display())).unwrap();
    let output = ImageDirectoryOutput::from_url(&url).unwrap();

    output.render_result(&frame(), &[]).unwrap();
    output.render_result(&frame(), &[pothole()]).unwrap();

    let shots = dir.path().join("shots");
    assert!(!shots.join("000001.png").exists());
    let image = image::open(shots.join("000002.png")).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (120, 80));
    assert_eq!(*image.get_pixel(10, 10), Rgb(RoadLabel::Pothole.color()));
  }

  #[test]
  fn test_always_saves_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}?always", dir.path().display())).unwrap();
    let output = ImageDirectoryOutput::from_url(&url).unwrap();

    output.render_result(&frame(), &[]).unwrap();
    assert!(dir.path().join("000001.png").exists());
  }

  #[test]
  fn test_scheme_mismatch() {
    let url = Url::parse("jsonl:///tmp/out.jsonl").unwrap();
    assert!(matches!(
      ImageDirectoryOutput::from_url(&url),
      Err(ImageDirectoryOutputError::SchemeMismatch(_))
    ));
  }
}
