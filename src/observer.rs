// 该文件是 Fenjian （分拣） 项目的一部分。
// src/observer.rs - 周期结果订阅接口
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
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use chrono::{DateTime, Local};
use image::RgbImage;

use crate::{
  actuator::ActuatorFault, model::Detection, sorting::Category, tally::TallyDelta,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SortedDetection {
  pub detection: Detection,
  // 类别 ID 超出目录时为 None
  pub name: Option<String>,
  // 不属于任何分拣集合时为 None
  pub category: Option<Category>,
}

impl SortedDetection {
  pub fn label(&self) -> String {
    let name = self
      .name
      .clone()
      .unwrap_or_else(|| format!("#{}", self.detection.class_id));
    format!(
      "{} {}%",
      name.to_uppercase(),
      (self.detection.confidence * 100.0) as i32
    )
  }
}

/// 一个完整周期的结果
#[derive(Debug, Clone)]
pub struct CycleReport {
  pub index: u64,
  pub captured_at: DateTime<Local>,
  pub frame: RgbImage,
  pub detections: Vec<SortedDetection>,
  pub delta: TallyDelta,
  pub unroutable: usize,
  pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
  Fetch { consecutive: u32, message: String },
  Actuator(ActuatorFault),
  Snapshot { message: String },
}

/// 分拣循环的订阅者，在后台线程中被调用
pub trait CycleObserver: Send {
  fn on_cycle(&mut self, _report: &CycleReport) {}
  fn on_fault(&mut self, _fault: &Fault) {}
}

#[derive(Clone, Default)]
pub struct SharedStatus {
  inner: Arc<Mutex<StatusInner>>,
}

#[derive(Default)]
struct StatusInner {
  cycles: u64,
  sorted: u64,
  last_delta: TallyDelta,
  faults: Vec<Fault>,
}

impl SharedStatus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cycles(&self) -> u64 {
    self.lock().cycles
  }

  pub fn sorted(&self) -> u64 {
    self.lock().sorted
  }

  pub fn last_delta(&self) -> TallyDelta {
    self.lock().last_delta.clone()
  }

  pub fn faults(&self) -> Vec<Fault> {
    self.lock().faults.clone()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, StatusInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CycleObserver for SharedStatus {
  fn on_cycle(&mut self, report: &CycleReport) {
    let mut inner = self.lock();
    inner.cycles += 1;
    inner.sorted += report.delta.values().sum::<u64>();
    inner.last_delta = report.delta.clone();
  }

  fn on_fault(&mut self, fault: &Fault) {
    self.lock().faults.push(fault.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BBox;

  #[test]
  fn label_uses_upper_case_name_and_percent() {
    let sorted = SortedDetection {
      detection: Detection {
        bbox: BBox {
          x: 0,
          y: 0,
          width: 1,
          height: 1,
        },
        class_id: 3,
        confidence: 0.876,
      },
      name: Some("hot dog".into()),
      category: Some(Category::Organic),
    };
    assert_eq!(sorted.label(), "HOT DOG 87%");

    let unknown = SortedDetection {
      name: None,
      ..sorted
    };
    assert_eq!(unknown.label(), "#3 87%");
  }
}
