// 该文件是 Fenjian （分拣） 项目的一部分。
// src/model.rs - 模型
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

use crate::frame::RgbNhwcFrame;

/// 检测网络：输入固定尺寸的帧，输出逐网格的原始预测行
pub trait Model {
  type Error;

  // (宽, 高)
  fn input_size(&self) -> (u32, u32);
  fn infer(&self, input: &RgbNhwcFrame) -> Result<Vec<RawPrediction>, Self::Error>;
}

/// 单个网格单元的原始预测
///
/// 行布局为 `[cx, cy, w, h, objectness, score_0, .., score_k]`，
/// 均相对于网络输入归一化到 [0, 1]。
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
  pub cx: f32,
  pub cy: f32,
  pub width: f32,
  pub height: f32,
  pub objectness: f32,
  pub scores: Box<[f32]>,
}

impl RawPrediction {
  pub const SCORE_OFFSET: usize = 5;

  pub fn from_row(row: &[f32]) -> Option<Self> {
    if row.len() < Self::SCORE_OFFSET {
      return None;
    }
    Some(Self {
      cx: row[0],
      cy: row[1],
      width: row[2],
      height: row[3],
      objectness: row[4],
      scores: row[Self::SCORE_OFFSET..].into(),
    })
  }

  /// 最高分类别 (类别 ID, 分数)；并列时取较小的 ID，NaN 分数不参与比较
  pub fn best_class(&self) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (class_id, &score) in self.scores.iter().enumerate() {
      if score.is_nan() {
        continue;
      }
      match best {
        Some((_, best_score)) if score <= best_score => {}
        _ => best = Some((class_id, score)),
      }
    }
    best
  }
}

// 左上角 + 宽高，像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl BBox {
  pub fn area(&self) -> f32 {
    self.width.max(0) as f32 * self.height.max(0) as f32
  }

  pub fn iou(&self, other: &BBox) -> f32 {
    let x1 = self.x.max(other.x);
    let y1 = self.y.max(other.y);
    let x2 = (self.x + self.width).min(other.x + other.width);
    let y2 = (self.y + self.height).min(other.y + other.height);

    let intersection = (x2 - x1).max(0) as f32 * (y2 - y1).max(0) as f32;
    let union = self.area() + other.area() - intersection;

    if union > 0.0 {
      intersection / union
    } else {
      0.0
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub bbox: BBox,
  pub class_id: usize,
  pub confidence: f32,
}

#[cfg(feature = "model_rknn")]
mod rknn;
#[cfg(feature = "model_rknn")]
pub use self::rknn::{RknnModel, RknnModelBuilder, RknnModelError};
