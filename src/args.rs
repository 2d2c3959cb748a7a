// 该文件是 Fenjian （分拣） 项目的一部分。
// src/args.rs - 命令行参数
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

use clap::Parser;
use url::Url;

use fenjian::config::{self, SorterConfig};

/// Fenjian 分拣控制器参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 摄像头快照地址
  /// 支持格式:
  /// - HTTP: http://192.168.142.243/320x320.jpg
  /// - 图片: image:///path/to/frame.jpg
  #[arg(long, default_value = config::DEFAULT_FRAME_URL, value_name = "URL")]
  pub frame: Url,

  /// RKNN 模型地址，例如 rknn:///opt/fenjian/yolov3.rknn
  #[arg(long, default_value = config::DEFAULT_MODEL_URL, value_name = "MODEL")]
  pub model: Url,

  /// 执行器链路
  /// 支持格式:
  /// - 串口: serial:///dev/ttyUSB0?baud=9600
  /// - 演练: dry-run:
  #[arg(long, default_value = config::DEFAULT_ACTUATOR_URL, value_name = "URL")]
  pub actuator: Url,

  /// 显示输出
  /// 支持格式:
  /// - 预览图: image:///tmp/fenjian.png
  /// - 记录目录: folder:///var/fenjian/frames[?always]
  /// - 不显示: none:
  #[arg(long, default_value = config::DEFAULT_OUTPUT_URL, value_name = "OUTPUT")]
  pub output: Url,

  /// 类别名称文件，每行一个
  #[arg(long, default_value = config::DEFAULT_CATALOG_PATH, value_name = "FILE")]
  pub catalog: PathBuf,

  /// 统计快照文件
  #[arg(long, default_value = config::DEFAULT_SNAPSHOT_PATH, value_name = "FILE")]
  pub snapshot: PathBuf,

  /// 日志文件
  #[arg(long, default_value = config::DEFAULT_LOG_PATH, value_name = "FILE")]
  pub log_file: PathBuf,

  /// 标签字体（TTF/OTF），不指定时只画框
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  /// 模型输入边长
  #[arg(long, default_value_t = config::DEFAULT_INPUT_SIZE, value_name = "PIXELS")]
  pub input_size: u32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = config::DEFAULT_CONF_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = config::DEFAULT_NMS_THRESHOLD, value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 启动前等待硬件链路稳定的时间
  #[arg(long, default_value_t = config::DEFAULT_STARTUP_DELAY_MS, value_name = "MS")]
  pub startup_delay_ms: u64,

  /// 单次取帧超时
  #[arg(long, default_value_t = config::DEFAULT_FETCH_TIMEOUT_MS, value_name = "MS")]
  pub fetch_timeout_ms: u64,

  #[arg(long, default_value_t = config::DEFAULT_FETCH_BACKOFF_BASE_MS, value_name = "MS")]
  pub fetch_backoff_base_ms: u64,

  #[arg(long, default_value_t = config::DEFAULT_FETCH_BACKOFF_MAX_MS, value_name = "MS")]
  pub fetch_backoff_max_ms: u64,

  /// 连续取帧失败多少次后报警
  #[arg(long, default_value_t = config::DEFAULT_MAX_FETCH_RETRIES, value_name = "COUNT")]
  pub max_fetch_retries: u32,

  /// 从已有快照继续累计
  #[arg(long)]
  pub resume: bool,

  /// 不等待 start 命令，直接启动
  #[arg(long)]
  pub autostart: bool,
}

impl Args {
  pub fn config(&self) -> SorterConfig {
    SorterConfig {
      frame_url: self.frame.clone(),
      model_url: self.model.clone(),
      actuator_url: self.actuator.clone(),
      output_url: self.output.clone(),
      catalog_path: self.catalog.clone(),
      snapshot_path: self.snapshot.clone(),
      log_path: self.log_file.clone(),
      font_path: self.font.clone(),
      input_size: self.input_size,
      conf_threshold: self.confidence,
      nms_threshold: self.nms_threshold,
      startup_delay: Duration::from_millis(self.startup_delay_ms),
      fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
      fetch_backoff_base: Duration::from_millis(self.fetch_backoff_base_ms),
      fetch_backoff_max: Duration::from_millis(self.fetch_backoff_max_ms),
      max_fetch_retries: self.max_fetch_retries,
    }
  }
}
