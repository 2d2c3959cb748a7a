// 该文件是 Fenjian （分拣） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
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

use crate::model::Detection;

/// 贪心非极大值抑制，不区分类别
///
/// 按置信度降序（稳定排序，同分保持解码顺序）逐个保留候选框，
/// 与任一已保留框 IoU 大于 `nms_threshold` 的候选框被丢弃。
pub fn suppress(
  mut candidates: Vec<Detection>,
  conf_threshold: f32,
  nms_threshold: f32,
) -> Vec<Detection> {
  candidates.retain(|det| det.confidence > conf_threshold);
  candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let total = candidates.len();
  let mut kept: Vec<Detection> = Vec::with_capacity(total);
  for candidate in candidates {
    if kept
      .iter()
      .all(|best| best.bbox.iou(&candidate.bbox) <= nms_threshold)
    {
      kept.push(candidate);
    }
  }

  debug!("NMS: {} 个候选框保留 {} 个", total, kept.len());
  kept
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BBox;
  use proptest::prelude::*;

  fn det(x: i32, y: i32, w: i32, h: i32, class_id: usize, confidence: f32) -> Detection {
    Detection {
      bbox: BBox {
        x,
        y,
        width: w,
        height: h,
      },
      class_id,
      confidence,
    }
  }

  #[test]
  fn empty_input_is_empty_output() {
    assert!(suppress(Vec::new(), 0.5, 0.3).is_empty());
  }

  #[test]
  fn overlapping_boxes_keep_the_most_confident() {
    let candidates = vec![
      det(0, 0, 100, 100, 0, 0.6),
      det(5, 5, 100, 100, 1, 0.9),
      det(300, 300, 50, 50, 2, 0.7),
    ];
    let kept = suppress(candidates, 0.5, 0.3);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].confidence, 0.9);
    assert_eq!(kept[0].class_id, 1);
    assert_eq!(kept[1].class_id, 2);
  }

  #[test]
  fn ties_keep_decode_order() {
    let candidates = vec![
      det(0, 0, 10, 10, 7, 0.8),
      det(1, 1, 10, 10, 3, 0.8),
      det(100, 100, 10, 10, 5, 0.8),
    ];
    let kept = suppress(candidates, 0.5, 0.3);
    assert_eq!(
      kept.iter().map(|d| d.class_id).collect::<Vec<_>>(),
      vec![7, 5]
    );
  }

  #[test]
  fn iou_equal_to_threshold_survives() {
    // IoU = 50 / 150 ≈ 0.333
    let candidates = vec![det(0, 0, 10, 10, 0, 0.9), det(5, 0, 10, 10, 0, 0.8)];
    assert_eq!(suppress(candidates.clone(), 0.5, 0.34).len(), 2);
    assert_eq!(suppress(candidates, 0.5, 0.33).len(), 1);
  }

  #[test]
  fn low_confidence_candidates_are_ignored() {
    let candidates = vec![det(0, 0, 10, 10, 0, 0.5), det(50, 50, 10, 10, 0, 0.51)];
    let kept = suppress(candidates, 0.5, 0.3);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].confidence, 0.51);
  }

  fn arb_detection() -> impl Strategy<Value = Detection> {
    (0i32..200, 0i32..200, 1i32..80, 1i32..80, 0usize..5, 0.51f32..1.0)
      .prop_map(|(x, y, w, h, class_id, confidence)| det(x, y, w, h, class_id, confidence))
  }

  proptest! {
    #[test]
    fn survivors_are_disjoint_subset(
      candidates in prop::collection::vec(arb_detection(), 0..40),
      nms_threshold in 0.05f32..0.95,
    ) {
      let kept = suppress(candidates.clone(), 0.5, nms_threshold);
      for (i, a) in kept.iter().enumerate() {
        prop_assert!(candidates.contains(a));
        for b in kept.iter().skip(i + 1) {
          prop_assert!(a.bbox.iou(&b.bbox) <= nms_threshold);
        }
      }
      prop_assert_eq!(kept.is_empty(), candidates.is_empty());
      for pair in kept.windows(2) {
        prop_assert!(pair[0].confidence >= pair[1].confidence);
      }
    }
  }
}
