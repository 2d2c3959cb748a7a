// 该文件是 Fenjian （分拣） 项目的一部分。
// src/input/http_snapshot.rs - 网络摄像头快照输入
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
use reqwest::{StatusCode, blocking::Client};
use tracing::debug;
use url::Url;

use crate::input::{FetchError, FrameSource};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// 通过 HTTP GET 拉取 JPEG 快照，例如 ESP32-CAM 的 `/320x320.jpg`
pub struct HttpSnapshotInput {
  url: Url,
  client: Client,
}

impl HttpSnapshotInput {
  pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { url, client })
  }

  pub fn url(&self) -> &Url {
    &self.url
  }
}

impl FrameSource for HttpSnapshotInput {
  type Error = FetchError;

  fn fetch(&mut self) -> Result<RgbImage, Self::Error> {
    let response = self.client.get(self.url.clone()).send()?;
    let status = response.status();
    if status != StatusCode::OK {
      return Err(FetchError::StatusError(status.as_u16()));
    }

    let bytes = response.bytes()?;
    debug!("获取快照 {} 字节", bytes.len());
    let image = image::load_from_memory(&bytes)?;
    Ok(image.to_rgb8())
  }
}
