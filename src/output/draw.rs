// 该文件是 Lumian （路面巡检） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;
use tracing::debug;

use crate::model::Annotation;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 14.0;
const HUD_FONT_SIZE: f32 = 20.0;
const HUD_POSITION: (i32, i32) = (8, 8);
const LABEL_TEXT_COLOR: [u8; 3] = [0, 0, 0];
const HUD_TEXT_COLOR: [u8; 3] = [255, 255, 255];
const BOX_THICKNESS: i32 = 2;
const MAX_TICK: i32 = 10;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 在帧上绘制检测框、角标、标签和检测数量
///
/// 没有字体时只绘制几何部分。
#[derive(Default)]
pub struct Draw {
  font: Option<FontVec>,
}

impl Draw {
  pub fn with_font_file<P: AsRef<Path>>(path: P) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data)?;
    Ok(Self { font: Some(font) })
  }

  pub fn draw_annotations(&self, image: &mut RgbImage, annotations: &[Annotation]) {
    for annotation in annotations {
      self.draw_annotation(image, annotation);
    }

    if let Some(font) = &self.font {
      draw_text_mut(
        image,
        Rgb(HUD_TEXT_COLOR),
        HUD_POSITION.0,
        HUD_POSITION.1,
        PxScale::from(HUD_FONT_SIZE),
        font,
        &format!("Det: {}", annotations.len()),
      );
    }
  }

  fn draw_annotation(&self, image: &mut RgbImage, annotation: &Annotation) {
    let color = Rgb(annotation.label.color());
    let x = annotation.bbox.x as i32;
    let y = annotation.bbox.y as i32;
    let w = annotation.bbox.width as i32;
    let h = annotation.bbox.height as i32;

    if w <= 0 || h <= 0 {
      debug!("跳过无法绘制的检测框: {:?}", annotation.bbox);
      return;
    }

    // 边框
    for t in 0..BOX_THICKNESS {
      let (bw, bh) = (w - 2 * t, h - 2 * t);
      if bw <= 0 || bh <= 0 {
        break;
      }
      draw_hollow_rect_mut(
        image,
        Rect::at(x + t, y + t).of_size(bw as u32, bh as u32),
        color,
      );
    }

    // 四角短线
    let tick = MAX_TICK.min(w / 5).min(h / 5);
    if tick > 0 {
      let (x1, y1) = (x + w - 1, y + h - 1);
      for (px, py, dx, dy) in [(x, y, 1, 1), (x1, y, -1, 1), (x, y1, 1, -1), (x1, y1, -1, -1)] {
        let (px, py) = (px as f32, py as f32);
        let (tx, ty) = ((dx * tick) as f32, (dy * tick) as f32);
        draw_line_segment_mut(image, (px, py), (px + tx, py), color);
        draw_line_segment_mut(image, (px, py), (px, py + ty), color);
      }
    }

    // 框上方的标签
    if let Some(font) = &self.font {
      let label = format!(
        "{} {:.2}",
        annotation.label.as_str_short(),
        annotation.confidence
      );
      let scale = PxScale::from(LABEL_FONT_SIZE);
      let (tw, th) = text_size(scale, font, &label);
      let th = th as i32;
      let ly = (y - 3).max(th + 2);

      let background = Rect::at(x, ly - th - 2).of_size(tw + 4, (th + 3) as u32);
      draw_filled_rect_mut(image, background, color);
      draw_text_mut(
        image,
        Rgb(LABEL_TEXT_COLOR),
        x + 2,
        ly - th - 1,
        scale,
        font,
        &label,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{label::RoadLabel, model::BBox};

  fn annotation(label: RoadLabel, x: f32, y: f32, w: f32, h: f32) -> Annotation {
    Annotation {
      bbox: BBox::new(x, y, w, h),
      class_name: label.as_str().to_string(),
      confidence: 0.9,
      label,
    }
  }

  #[test]
  fn test_box_and_ticks_drawn_in_class_color() {
    let mut image = RgbImage::new(100, 100);
    let draw = Draw::default();
    draw.draw_annotations(
      &mut image,
      &[annotation(RoadLabel::Pothole, 10.0, 20.0, 50.0, 40.0)],
    );

    let red = Rgb(RoadLabel::Pothole.color());
    assert_eq!(*image.get_pixel(10, 20), red);
    assert_eq!(*image.get_pixel(11, 40), red);
    assert_eq!(*image.get_pixel(59, 59), red);
    // 框内部保持原样
    assert_eq!(*image.get_pixel(35, 40), Rgb([0, 0, 0]));
  }

  #[test]
  fn test_edge_and_tiny_boxes_do_not_panic() {
    let mut image = RgbImage::new(64, 48);
    let draw = Draw::default();
    draw.draw_annotations(
      &mut image,
      &[
        annotation(RoadLabel::TransverseCrack, 0.0, 0.0, 64.0, 48.0),
        annotation(RoadLabel::AlligatorCrack, 63.0, 47.0, 1.0, 1.0),
        annotation(RoadLabel::LongitudinalCrack, 10.0, 10.0, 0.0, 5.0),
      ],
    );
  }
}
