// 该文件是 Fenjian （分拣） 项目的一部分。
// src/input.rs - 图像帧来源
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

use std::time::Duration;

use image::RgbImage;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

mod http_snapshot;
mod image_file;

pub use self::http_snapshot::HttpSnapshotInput;
pub use self::image_file::ImageFileInput;

/// 每个周期取一帧静态图像
pub trait FrameSource {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch(&mut self) -> Result<RgbImage, Self::Error>;
}

#[derive(Error, Debug)]
pub enum FetchError {
  #[error("HTTP 请求失败: {0}")]
  HttpError(#[from] reqwest::Error),
  #[error("HTTP 状态码异常: {0}")]
  StatusError(u16),
  #[error("图像解码失败: {0}")]
  DecodeError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  HttpSnapshot(HttpSnapshotInput),
  ImageFile(ImageFileInput),
}

impl InputWrapper {
  /// 按 URI 方案创建帧来源；HTTP 来源使用给定的请求超时
  pub fn open(url: &Url, timeout: Duration) -> Result<Self, FetchError> {
    match url.scheme() {
      "http" | "https" => Ok(InputWrapper::HttpSnapshot(HttpSnapshotInput::new(
        url.clone(),
        timeout,
      )?)),
      ImageFileInput::SCHEME => Ok(InputWrapper::ImageFile(ImageFileInput::from_url(url)?)),
      other => Err(FetchError::SchemeMismatch(other.to_string())),
    }
  }
}

impl FromUrl for InputWrapper {
  type Error = FetchError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    Self::open(url, http_snapshot::DEFAULT_TIMEOUT)
  }
}

impl FrameSource for InputWrapper {
  type Error = FetchError;

  fn fetch(&mut self) -> Result<RgbImage, Self::Error> {
    match self {
      InputWrapper::HttpSnapshot(input) => input.fetch(),
      InputWrapper::ImageFile(input) => input.fetch(),
    }
  }
}
