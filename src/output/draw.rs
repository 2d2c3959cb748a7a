// 该文件是 Fenjian （分拣） 项目的一部分。
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
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use tracing::info;

use crate::{model::BBox, observer::SortedDetection};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 18.0;
const LABEL_TEXT_HEIGHT: i32 = 22;
const LABEL_CHAR_WIDTH: f32 = 10.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BOX_COLOR: [u8; 3] = [255, 0, 255]; // 品红
const BOX_THICKNESS: i32 = 2;

pub struct Draw {
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  font: Option<FontVec>,
  color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      font: None,
      color: BOX_COLOR,
    }
  }
}

impl Draw {
  /// 加载 TrueType 字体；未加载字体时只画框不画标签
  pub fn with_font_file(mut self, path: impl AsRef<Path>) -> std::io::Result<Self> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    info!("加载标签字体: {}", path.display());
    self.font = Some(font);
    Ok(self)
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn draw_detections(&self, image: &mut RgbImage, detections: &[SortedDetection]) {
    for sorted in detections {
      self.draw_bbox_with_label(image, &sorted.detection.bbox, &sorted.label());
    }
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, bbox: &BBox, label: &str) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    // 裁剪到图像范围内
    let x_min = bbox.x.clamp(0, w - 1);
    let y_min = bbox.y.clamp(0, h - 1);
    let x_max = (bbox.x + bbox.width).clamp(0, w - 1);
    let y_max = (bbox.y + bbox.height).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    for thickness in 0..BOX_THICKNESS {
      let width = x_max - x_min - 2 * thickness;
      let height = y_max - y_min - 2 * thickness;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + thickness, y_min + thickness).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, Rgb(self.color));
    }

    let Some(font) = self.font.as_ref() else {
      return;
    };

    let text_width = (label.len() as f32 * self.label_char_width) as i32;
    let label_x = x_min;
    let label_y = (y_min - self.label_text_height).max(0);
    let label_width = text_width.min(w - label_x);

    if label_width > 0 {
      let rect =
        Rect::at(label_x, label_y).of_size(label_width as u32, self.label_text_height as u32);
      draw_filled_rect_mut(image, rect, Rgb(self.color));
      draw_text_mut(
        image,
        Rgb([255u8, 255u8, 255u8]),
        label_x,
        label_y + self.label_text_vertical_padding,
        PxScale::from(self.font_size),
        font,
        label,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{model::Detection, sorting::Category};

  fn sorted(x: i32, y: i32, width: i32, height: i32) -> SortedDetection {
    SortedDetection {
      detection: Detection {
        bbox: BBox {
          x,
          y,
          width,
          height,
        },
        class_id: 0,
        confidence: 0.9,
      },
      name: Some("apple".into()),
      category: Some(Category::Organic),
    }
  }

  #[test]
  fn draws_box_outline_only() {
    let mut image = RgbImage::new(64, 64);
    Draw::default().draw_detections(&mut image, &[sorted(10, 10, 20, 20)]);
    assert_eq!(image.get_pixel(10, 10), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(11, 11), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(20, 20), &Rgb([0, 0, 0]));
  }

  #[test]
  fn out_of_frame_boxes_are_clamped_or_skipped() {
    let mut image = RgbImage::new(32, 32);
    let draw = Draw::default();
    draw.draw_detections(&mut image, &[sorted(-10, -10, 20, 20)]);
    assert_eq!(image.get_pixel(0, 0), &Rgb(BOX_COLOR));
    let mut blank = RgbImage::new(32, 32);
    draw.draw_detections(&mut blank, &[sorted(100, 100, 10, 10), sorted(5, 5, 0, 0)]);
    assert!(blank.pixels().all(|p| p == &Rgb([0, 0, 0])));
  }
}
