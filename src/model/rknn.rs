// 该文件是 Fenjian （分拣） 项目的一部分。
// src/model/rknn.rs - RKNN 检测网络后端
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

use rknpu::{Context, InitFlags, TensorType};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbNhwcFrame,
  model::{Model, RawPrediction},
};

const RKNN_NUM_INPUTS: u32 = 1;
const RKNN_DEFAULT_INPUT_SIZE: u32 = 224;
const RKNN_DEFAULT_CLASS_NUM: usize = 80;

#[derive(Error, Debug)]
pub enum RknnModelError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, rknpu::Error),
  #[error("RKNN 错误: {0}")]
  RknnError(#[from] rknpu::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("输入尺寸不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InputShapeMismatch {
    expected: (u32, u32),
    actual: (u32, u32),
  },
  #[error("第 {index} 个输出长度 {len} 不是行长度 {row_len} 的整数倍")]
  OutputShapeMismatch {
    index: u32,
    len: usize,
    row_len: usize,
  },
}

impl RknnModelError {
  pub fn invalid(msg: &str, e: rknpu::Error) -> Self {
    RknnModelError::ModelInvalid(msg.to_string(), e)
  }
}

pub struct RknnModelBuilder {
  model_path: String,
  flags: InitFlags,
  input_size: (u32, u32),
  num_classes: usize,
}

impl FromUrlWithScheme for RknnModelBuilder {
  const SCHEME: &'static str = "rknn";
}

impl FromUrl for RknnModelBuilder {
  type Error = RknnModelError;

  /// `rknn:///path/to/model.rknn?size=224`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RknnModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let size = url
      .query_pairs()
      .find(|(k, _)| k == "size")
      .and_then(|(_, v)| v.parse::<u32>().ok())
      .unwrap_or(RKNN_DEFAULT_INPUT_SIZE);

    Ok(RknnModelBuilder {
      model_path: url.path().to_string(),
      flags: InitFlags::default(),
      input_size: (size, size),
      num_classes: RKNN_DEFAULT_CLASS_NUM,
    })
  }
}

impl RknnModelBuilder {
  pub fn flags(mut self, flags: InitFlags) -> Self {
    self.flags = flags;
    self
  }

  pub fn input_size(mut self, width: u32, height: u32) -> Self {
    self.input_size = (width, height);
    self
  }

  /// 类别数量须与类别目录一致，决定每行的长度
  pub fn num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = num_classes;
    self
  }

  pub fn build(self) -> Result<RknnModel, RknnModelError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 RKNN 推理上下文");
    let context = Context::new(&model_data, self.flags)?;

    match context.sdk_version() {
      Ok(version) => {
        if let Ok(api_ver) = version.api_version() {
          debug!("模型 API 版本: {}", api_ver);
        }
        if let Ok(drv_ver) = version.driver_version() {
          debug!("模型驱动版本: {}", drv_ver);
        }
      }
      Err(e) => {
        error!("查询 SDK 版本失败: {}", e);
        return Err(RknnModelError::invalid("无法查询 SDK 版本", e));
      }
    }

    let num_inputs = context
      .num_inputs()
      .map_err(|e| RknnModelError::invalid("无法获取输入数量", e))?;
    let num_outputs = context
      .num_outputs()
      .map_err(|e| RknnModelError::invalid("无法获取输出数量", e))?;

    if num_inputs != RKNN_NUM_INPUTS {
      error!("预期模型输入数量为 {}, 实际为 {}", RKNN_NUM_INPUTS, num_inputs);
      return Err(RknnModelError::invalid(
        &format!("预期模型输入数量为 {}, 实际为 {}", RKNN_NUM_INPUTS, num_inputs),
        rknpu::Error::InvalidModel,
      ));
    }

    debug!("模型输出数量: {}", num_outputs);
    info!(
      "模型加载完成，输入尺寸 {}x{}，类别数量 {}",
      self.input_size.0, self.input_size.1, self.num_classes
    );

    Ok(RknnModel {
      context,
      num_outputs,
      input_size: self.input_size,
      row_len: RawPrediction::SCORE_OFFSET + self.num_classes,
    })
  }
}

pub struct RknnModel {
  context: Context,
  num_outputs: u32,
  input_size: (u32, u32),
  row_len: usize,
}

// SAFETY: 上下文随模型一起移交给分拣线程，此后只在该线程内顺序调用，不会并发访问
unsafe impl Send for RknnModel {}

impl RknnModel {
  /// 把每个输出张量按行切分为原始预测
  fn postprocess(&self, tensors: &[&[f32]]) -> Result<Vec<RawPrediction>, RknnModelError> {
    let mut rows = Vec::new();
    for (index, tensor) in tensors.iter().enumerate() {
      if tensor.len() % self.row_len != 0 {
        return Err(RknnModelError::OutputShapeMismatch {
          index: index as u32,
          len: tensor.len(),
          row_len: self.row_len,
        });
      }
      rows.extend(
        tensor
          .chunks_exact(self.row_len)
          .filter_map(RawPrediction::from_row),
      );
    }
    debug!("模型输出 {} 行预测", rows.len());
    Ok(rows)
  }
}

impl Model for RknnModel {
  type Error = RknnModelError;

  fn input_size(&self) -> (u32, u32) {
    self.input_size
  }

  fn infer(&self, input: &RgbNhwcFrame) -> Result<Vec<RawPrediction>, Self::Error> {
    let actual = (input.width() as u32, input.height() as u32);
    if actual != self.input_size {
      return Err(RknnModelError::InputShapeMismatch {
        expected: self.input_size,
        actual,
      });
    }

    debug!("设置模型输入");
    self.context.set_input(
      0,
      input.as_nhwc(),
      rknpu::TensorFormat::NHWC,
      TensorType::UInt8,
    )?;

    debug!("执行模型推理");
    self.context.run()?;

    let output = self.context.get_outputs()?;
    let mut tensors = Vec::with_capacity(self.num_outputs as usize);
    for index in 0..self.num_outputs as usize {
      tensors.push(output.get_f32(index)?);
    }

    self.postprocess(&tensors)
  }
}
