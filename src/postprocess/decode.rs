// 该文件是 Fenjian （分拣） 项目的一部分。
// src/postprocess/decode.rs - 原始预测解码
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

use tracing::debug;

use crate::model::{BBox, Detection, RawPrediction};

/// 将归一化的中心点坐标转换为原始帧上的像素框
///
/// 只保留最高类别分数严格大于 `conf_threshold` 的行，其余静默丢弃。
pub fn decode(
  rows: &[RawPrediction],
  frame_width: u32,
  frame_height: u32,
  conf_threshold: f32,
) -> Vec<Detection> {
  let (fw, fh) = (frame_width as f32, frame_height as f32);

  let detections = rows
    .iter()
    .filter_map(|row| {
      let (class_id, confidence) = row.best_class()?;
      if !(confidence > conf_threshold) {
        return None;
      }

      // 与原始实现一致：宽高先截断为整数，再求左上角
      let width = (row.width * fw) as i32;
      let height = (row.height * fh) as i32;
      let x = (row.cx * fw - width as f32 / 2.0) as i32;
      let y = (row.cy * fh - height as f32 / 2.0) as i32;

      Some(Detection {
        bbox: BBox {
          x,
          y,
          width,
          height,
        },
        class_id,
        confidence,
      })
    })
    .collect::<Vec<_>>();

  debug!("解码得到 {} 个候选框 (共 {} 行)", detections.len(), rows.len());
  detections
}
