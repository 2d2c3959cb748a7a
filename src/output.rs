// 该文件是 Fenjian （分拣） 项目的一部分。
// src/output.rs - 显示输出定义
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

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  observer::{CycleObserver, CycleReport},
};

pub trait Render: Sized {
  type Error;
  fn render_result(&self, report: &CycleReport) -> Result<(), Self::Error>;
}

pub mod draw;

mod directory_record;
mod save_image_file;

pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  SaveImageFileOutput(SaveImageFileOutput),
  DirectoryRecordOutput(DirectoryRecordOutput),
  /// 不显示
  Null,
}

const NULL_OUTPUT_SCHEME: &str = "none";

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      NULL_OUTPUT_SCHEME => Ok(OutputWrapper::Null),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, report: &CycleReport) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(report)
        .map_err(OutputError::from),
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(report)
        .map_err(OutputError::from),
      OutputWrapper::Null => Ok(()),
    }
  }
}

/// 把显示输出接入分拣循环
pub struct RenderObserver<R> {
  output: R,
}

impl<R> RenderObserver<R> {
  pub fn new(output: R) -> Self {
    Self { output }
  }
}

impl<R> CycleObserver for RenderObserver<R>
where
  R: Render + Send,
  R::Error: std::fmt::Display,
{
  fn on_cycle(&mut self, report: &CycleReport) {
    if let Err(e) = self.output.render_result(report) {
      warn!("第 {} 周期画面输出失败: {}", report.index, e);
    }
  }
}
