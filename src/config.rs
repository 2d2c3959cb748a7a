// 该文件是 Fenjian （分拣） 项目的一部分。
// src/config.rs - 运行配置
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

use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

use crate::{postprocess::PostProcess, utils::Backoff};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("{name} 必须在 (0, 1) 之间，实际为 {value}")]
  ThresholdOutOfRange { name: &'static str, value: f32 },
  #[error("模型输入尺寸必须大于 0")]
  ZeroInputSize,
  #[error("取帧退避参数无效: 基础 {base:?}, 上限 {max:?}")]
  InvalidBackoff { base: Duration, max: Duration },
  #[error("取帧重试上限必须大于 0")]
  ZeroRetryLimit,
  #[error("{name} 不支持的 URI 方案: {url}")]
  UnsupportedScheme { name: &'static str, url: String },
}

// 命令行缺省值
pub const DEFAULT_FRAME_URL: &str = "http://192.168.142.243/320x320.jpg";
pub const DEFAULT_MODEL_URL: &str = "rknn:///opt/fenjian/yolov3.rknn";
pub const DEFAULT_ACTUATOR_URL: &str = "serial:///dev/ttyUSB0?baud=9600";
pub const DEFAULT_OUTPUT_URL: &str = "none:";
pub const DEFAULT_CATALOG_PATH: &str = "coco.names";
pub const DEFAULT_SNAPSHOT_PATH: &str = "detected_objects.json";
pub const DEFAULT_LOG_PATH: &str = "app.log";
pub const DEFAULT_INPUT_SIZE: u32 = 224;
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.5;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.3;
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 1000;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_FETCH_BACKOFF_BASE_MS: u64 = 100;
pub const DEFAULT_FETCH_BACKOFF_MAX_MS: u64 = 10_000;
pub const DEFAULT_MAX_FETCH_RETRIES: u32 = 10;

/// 分拣控制器的全部可调参数
#[derive(Debug, Clone, PartialEq)]
pub struct SorterConfig {
  /// 摄像头快照地址
  pub frame_url: Url,
  /// 检测模型地址
  pub model_url: Url,
  /// 执行器链路地址，包含设备与波特率
  pub actuator_url: Url,
  /// 显示输出地址
  pub output_url: Url,
  pub catalog_path: PathBuf,
  pub snapshot_path: PathBuf,
  pub log_path: PathBuf,
  pub font_path: Option<PathBuf>,
  /// 模型输入边长（正方形）
  pub input_size: u32,
  pub conf_threshold: f32,
  pub nms_threshold: f32,
  pub startup_delay: Duration,
  pub fetch_timeout: Duration,
  pub fetch_backoff_base: Duration,
  pub fetch_backoff_max: Duration,
  pub max_fetch_retries: u32,
}

impl SorterConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    for (name, value) in [
      ("conf_threshold", self.conf_threshold),
      ("nms_threshold", self.nms_threshold),
    ] {
      if !(value > 0.0 && value < 1.0) {
        return Err(ConfigError::ThresholdOutOfRange { name, value });
      }
    }
    if self.input_size == 0 {
      return Err(ConfigError::ZeroInputSize);
    }
    if self.fetch_backoff_base.is_zero() || self.fetch_backoff_base > self.fetch_backoff_max {
      return Err(ConfigError::InvalidBackoff {
        base: self.fetch_backoff_base,
        max: self.fetch_backoff_max,
      });
    }
    if self.max_fetch_retries == 0 {
      return Err(ConfigError::ZeroRetryLimit);
    }

    Self::check_scheme("frame_url", &self.frame_url, &["http", "https", "image"])?;
    Self::check_scheme("actuator_url", &self.actuator_url, &["serial", "dry-run"])?;
    Self::check_scheme("output_url", &self.output_url, &["image", "folder", "none"])?;
    Ok(())
  }

  fn check_scheme(name: &'static str, url: &Url, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&url.scheme()) {
      Ok(())
    } else {
      Err(ConfigError::UnsupportedScheme {
        name,
        url: url.to_string(),
      })
    }
  }

  pub fn post_process(&self) -> PostProcess {
    PostProcess {
      conf_threshold: self.conf_threshold,
      nms_threshold: self.nms_threshold,
    }
  }

  pub fn fetch_backoff(&self) -> Backoff {
    Backoff::new(
      self.fetch_backoff_base,
      self.fetch_backoff_max,
      self.max_fetch_retries,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn defaults() -> SorterConfig {
    SorterConfig {
      frame_url: Url::parse(DEFAULT_FRAME_URL).unwrap(),
      model_url: Url::parse(DEFAULT_MODEL_URL).unwrap(),
      actuator_url: Url::parse(DEFAULT_ACTUATOR_URL).unwrap(),
      output_url: Url::parse(DEFAULT_OUTPUT_URL).unwrap(),
      catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
      snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
      log_path: PathBuf::from(DEFAULT_LOG_PATH),
      font_path: None,
      input_size: DEFAULT_INPUT_SIZE,
      conf_threshold: DEFAULT_CONF_THRESHOLD,
      nms_threshold: DEFAULT_NMS_THRESHOLD,
      startup_delay: Duration::from_millis(DEFAULT_STARTUP_DELAY_MS),
      fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
      fetch_backoff_base: Duration::from_millis(DEFAULT_FETCH_BACKOFF_BASE_MS),
      fetch_backoff_max: Duration::from_millis(DEFAULT_FETCH_BACKOFF_MAX_MS),
      max_fetch_retries: DEFAULT_MAX_FETCH_RETRIES,
    }
  }

  #[test]
  fn builtin_defaults_parse_and_validate() {
    let config = defaults();
    assert_eq!(config.validate(), Ok(()));
    assert_eq!(config.frame_url.scheme(), "http");
    assert_eq!(config.model_url.scheme(), "rknn");
    assert_eq!(config.actuator_url.scheme(), "serial");
    assert_eq!(config.output_url.scheme(), "none");
    assert_eq!(config.input_size, 224);
    assert_eq!(config.post_process().conf_threshold, 0.5);
    assert_eq!(config.post_process().nms_threshold, 0.3);
    assert_eq!(config.fetch_backoff().max_retries(), 10);
  }

  #[test]
  fn thresholds_must_be_open_unit_interval() {
    let config = SorterConfig {
      nms_threshold: 1.0,
      ..defaults()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::ThresholdOutOfRange {
        name: "nms_threshold",
        ..
      })
    ));
    let config = SorterConfig {
      conf_threshold: f32::NAN,
      ..defaults()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn rejects_bad_backoff_and_sizes() {
    let config = SorterConfig {
      fetch_backoff_base: Duration::from_secs(20),
      ..defaults()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::InvalidBackoff { .. })
    ));
    let config = SorterConfig {
      input_size: 0,
      ..defaults()
    };
    assert_eq!(config.validate(), Err(ConfigError::ZeroInputSize));
    let config = SorterConfig {
      max_fetch_retries: 0,
      ..defaults()
    };
    assert_eq!(config.validate(), Err(ConfigError::ZeroRetryLimit));
  }

  #[test]
  fn rejects_unknown_schemes() {
    let config = SorterConfig {
      actuator_url: Url::parse("tcp://10.0.0.2:502").unwrap(),
      ..defaults()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::UnsupportedScheme {
        name: "actuator_url",
        ..
      })
    ));
  }
}
