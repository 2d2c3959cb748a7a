// 该文件是 Fenjian （分拣） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
  path::{Path, PathBuf},
  sync::atomic::{AtomicU16, Ordering},
};

use chrono::Datelike;
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  observer::{CycleReport, SortedDetection},
  output::Render,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按日期分目录保存带标注的帧，并在同名 `.txt` 中记录检测结果
///
/// `folder:///var/fenjian/frames` 只保存有检测结果的周期，
/// 加上 `?always` 后每个周期都保存。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      frame_counter: AtomicU16::new(0),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn frame_path(&self, report: &CycleReport) -> Result<PathBuf, DirectoryRecordOutputError> {
    let at = report.captured_at;
    let directory = self
      .directory
      .join(at.year().to_string())
      .join(format!("{:02}", at.month()))
      .join(format!("{:02}", at.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      at.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn record(detections: &[SortedDetection], path: &Path) -> Result<(), std::io::Error> {
    let records = detections
      .iter()
      .map(|sorted| {
        let det = &sorted.detection;
        format!(
          "{}, {}, {:.4}, {}, {}, {}, {}",
          sorted.name.as_deref().unwrap_or("unknown"),
          sorted
            .category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Unroutable".to_string()),
          det.confidence,
          det.bbox.x,
          det.bbox.y,
          det.bbox.width,
          det.bbox.height
        )
      })
      .collect::<Vec<_>>();
    std::fs::write(path.with_extension("txt"), records.join("\n"))
  }
}

impl Render for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, report: &CycleReport) -> Result<(), Self::Error> {
    if !self.always && report.detections.is_empty() {
      return Ok(());
    }

    let path = self.frame_path(report)?;
    report.frame.save(&path)?;
    Self::record(&report.detections, &path)?;
    debug!("第 {} 周期画面已记录到: {}", report.index, path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::{BBox, Detection},
    sorting::Category,
    tally::TallyDelta,
  };
  use chrono::Local;
  use image::RgbImage;
  use std::time::Duration;

  fn report(detections: Vec<SortedDetection>) -> CycleReport {
    CycleReport {
      index: 1,
      captured_at: Local::now(),
      frame: RgbImage::new(16, 16),
      detections,
      delta: TallyDelta::new(),
      unroutable: 0,
      elapsed: Duration::from_millis(5),
    }
  }

  fn count_files(dir: &Path, ext: &str) -> usize {
    let mut total = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        total += count_files(&path, ext);
      } else if path.extension().is_some_and(|e| e == ext) {
        total += 1;
      }
    }
    total
  }

  #[test]
  fn skips_empty_cycles_unless_always() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    output.render_result(&report(Vec::new())).unwrap();
    assert_eq!(count_files(dir.path(), "png"), 0);

    let url = url::Url::parse(&format!("folder://{}?always", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    output.render_result(&report(Vec::new())).unwrap();
    assert_eq!(count_files(dir.path(), "png"), 1);
  }

  #[test]
  fn records_detections_next_to_frame() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    let detections = vec![SortedDetection {
      detection: Detection {
        bbox: BBox {
          x: 1,
          y: 2,
          width: 3,
          height: 4,
        },
        class_id: 0,
        confidence: 0.75,
      },
      name: Some("car".into()),
      category: Some(Category::Inorganic),
    }];
    output.render_result(&report(detections)).unwrap();
    assert_eq!(count_files(dir.path(), "png"), 1);
    assert_eq!(count_files(dir.path(), "txt"), 1);
  }
}
