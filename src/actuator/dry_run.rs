// 该文件是 Fenjian （分拣） 项目的一部分。
// src/actuator/dry_run.rs - 空跑执行器
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

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  actuator::{Actuator, ActuatorError},
};

/// 不连接硬件，只把命令字节写入日志
#[derive(Debug, Default)]
pub struct DryRunActuator {
  written: u64,
}

impl FromUrlWithScheme for DryRunActuator {
  const SCHEME: &'static str = "dry-run";
}

impl FromUrl for DryRunActuator {
  type Error = ActuatorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ActuatorError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(Self::default())
  }
}

impl DryRunActuator {
  pub fn written(&self) -> u64 {
    self.written
  }
}

impl Actuator for DryRunActuator {
  type Error = ActuatorError;

  fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
    self.written += 1;
    info!("[空跑] 执行器命令 {:?}", byte as char);
    Ok(())
  }

  fn close(&mut self) -> Result<(), Self::Error> {
    info!("[空跑] 执行器关闭，共发送 {} 条命令", self.written);
    Ok(())
  }
}
