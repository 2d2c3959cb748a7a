// 该文件是 Fenjian （分拣） 项目的一部分。
// src/postprocess.rs - 检测后处理：解码与非极大值抑制
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

mod decode;
mod nms;

pub use self::decode::decode;
pub use self::nms::suppress;

use crate::model::{Detection, RawPrediction};

/// 后处理参数
#[derive(Debug, Clone, Copy)]
pub struct PostProcess {
  pub conf_threshold: f32,
  pub nms_threshold: f32,
}

impl Default for PostProcess {
  fn default() -> Self {
    Self {
      conf_threshold: 0.5,
      nms_threshold: 0.3,
    }
  }
}

impl PostProcess {
  /// 解码 + 抑制，输出按置信度降序排列
  pub fn run(&self, rows: &[RawPrediction], frame_width: u32, frame_height: u32) -> Vec<Detection> {
    let candidates = decode(rows, frame_width, frame_height, self.conf_threshold);
    suppress(candidates, self.conf_threshold, self.nms_threshold)
  }
}
