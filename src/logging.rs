// 该文件是 Fenjian （分拣） 项目的一部分。
// src/logging.rs - 运行日志
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

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{
  EnvFilter, fmt, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 同时输出到终端与日志文件（追加写入），级别由 `RUST_LOG` 控制，默认 `info`
pub fn init_logging(log_path: &Path) -> anyhow::Result<()> {
  if let Some(parent) = log_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(log_path)?;

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_timer(ChronoLocal::new(TIME_FORMAT.to_string())))
    .with(
      fmt::layer()
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_writer(Mutex::new(file)),
    )
    .try_init()?;

  Ok(())
}
