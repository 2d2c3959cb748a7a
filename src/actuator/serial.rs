// 该文件是 Fenjian （分拣） 项目的一部分。
// src/actuator/serial.rs - 串口执行器
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

use std::{io::Write, time::Duration};

use serialport::SerialPort;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  actuator::{Actuator, ActuatorError},
};

const DEFAULT_BAUD_RATE: u32 = 9600;
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// 串口链路，进程启动时打开一次，由执行器工作线程独占
pub struct SerialActuator {
  port_name: String,
  baud_rate: u32,
  port: Option<Box<dyn SerialPort>>,
}

impl FromUrlWithScheme for SerialActuator {
  const SCHEME: &'static str = "serial";
}

/// 解析 `serial:///dev/ttyUSB0?baud=9600` 或 `serial://COM15?baud=9600`
pub fn parse_serial_url(url: &Url) -> Result<(String, u32), ActuatorError> {
  if url.scheme() != SerialActuator::SCHEME {
    return Err(ActuatorError::SchemeMismatch(url.scheme().to_string()));
  }

  let port_name = match url.host_str() {
    Some(host) if !host.is_empty() => host.to_string(),
    _ => url.path().to_string(),
  };
  if port_name.is_empty() || port_name == "/" {
    return Err(ActuatorError::InvalidUrl(format!("缺少串口设备: {}", url)));
  }

  let baud_rate = match url.query_pairs().find(|(k, _)| k == "baud") {
    Some((_, v)) => v
      .parse::<u32>()
      .map_err(|_| ActuatorError::InvalidUrl(format!("波特率无效: {}", v)))?,
    None => DEFAULT_BAUD_RATE,
  };

  Ok((port_name, baud_rate))
}

impl FromUrl for SerialActuator {
  type Error = ActuatorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let (port_name, baud_rate) = parse_serial_url(url)?;
    Self::open(&port_name, baud_rate)
  }
}

impl SerialActuator {
  pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ActuatorError> {
    info!("打开串口 {}，波特率 {}", port_name, baud_rate);
    let port = serialport::new(port_name, baud_rate)
      .timeout(WRITE_TIMEOUT)
      .open()?;
    Ok(Self {
      port_name: port_name.to_string(),
      baud_rate,
      port: Some(port),
    })
  }

  pub fn port_name(&self) -> &str {
    &self.port_name
  }

  pub fn baud_rate(&self) -> u32 {
    self.baud_rate
  }
}

impl Actuator for SerialActuator {
  type Error = ActuatorError;

  fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
    let port = self.port.as_mut().ok_or(ActuatorError::Closed)?;
    port.write_all(&[byte])?;
    port.flush()?;
    Ok(())
  }

  fn close(&mut self) -> Result<(), Self::Error> {
    if let Some(mut port) = self.port.take() {
      port.flush()?;
      info!("串口 {} 已关闭", self.port_name);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_unix_device_path() {
    let url = Url::parse("serial:///dev/ttyUSB0?baud=115200").unwrap();
    assert_eq!(
      parse_serial_url(&url).unwrap(),
      ("/dev/ttyUSB0".to_string(), 115200)
    );
  }

  #[test]
  fn parses_windows_port_with_default_baud() {
    let url = Url::parse("serial://COM15").unwrap();
    let (port, baud) = parse_serial_url(&url).unwrap();
    assert_eq!(port.to_uppercase(), "COM15");
    assert_eq!(baud, 9600);
  }

  #[test]
  fn rejects_bad_baud_and_missing_device() {
    let url = Url::parse("serial:///dev/ttyACM0?baud=fast").unwrap();
    assert!(matches!(
      parse_serial_url(&url),
      Err(ActuatorError::InvalidUrl(_))
    ));
    let url = Url::parse("serial:///").unwrap();
    assert!(matches!(
      parse_serial_url(&url),
      Err(ActuatorError::InvalidUrl(_))
    ));
  }
}
