// 该文件是 Fenjian （分拣） 项目的一部分。
// src/actuator.rs - 分拣执行器控制
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
  sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{self, Receiver, SyncSender, TrySendError},
  },
  thread::{self, JoinHandle},
  time::Duration,
};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, sorting::Category, utils::Backoff, utils::StopSignal};

mod dry_run;
mod serial;

pub use self::dry_run::DryRunActuator;
pub use self::serial::SerialActuator;

// 有机物送出后的稳定时间
pub const SETTLE_DELAY: Duration = Duration::from_millis(400);
// 无机物输送距离更长，转向器动作前先等待
pub const INORGANIC_TRAVEL_DELAY: Duration = Duration::from_millis(1200);
// 队列再长，转向器动作就会明显落后于对应的物体
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

#[derive(Error, Debug)]
pub enum ActuatorError {
  #[error("串口错误: {0}")]
  SerialError(#[from] serialport::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("执行器连接已关闭")]
  Closed,
  #[error("执行器命令队列已关闭")]
  QueueClosed,
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("执行器地址无效: {0}")]
  InvalidUrl(String),
}

/// 硬件链路：只写，每条命令一个字节，不读回应答
pub trait Actuator: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

  fn close(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
  pub route: Category,
}

impl ActuatorCommand {
  pub fn new(route: Category) -> Self {
    Self { route }
  }

  pub fn byte(&self) -> u8 {
    match self.route {
      Category::Organic => b'1',
      Category::Inorganic => b'2',
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  Wait(Duration),
  Send(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationTiming {
  pub settle: Duration,
  pub inorganic_travel: Duration,
}

impl Default for ActuationTiming {
  fn default() -> Self {
    Self {
      settle: SETTLE_DELAY,
      inorganic_travel: INORGANIC_TRAVEL_DELAY,
    }
  }
}

impl ActuationTiming {
  pub fn steps(&self, command: ActuatorCommand) -> Vec<Step> {
    match command.route {
      Category::Organic => vec![Step::Send(command.byte()), Step::Wait(self.settle)],
      Category::Inorganic => vec![
        Step::Wait(self.inorganic_travel),
        Step::Send(command.byte()),
        Step::Wait(self.settle),
      ],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorFault {
  pub command: ActuatorCommand,
  pub attempts: u32,
  pub message: String,
}

#[derive(Debug)]
enum Outcome {
  Done,
  Interrupted,
  Failed(ActuatorFault),
}

pub struct ActuatorController<A: Actuator> {
  actuator: A,
  timing: ActuationTiming,
  retry: Backoff,
  queue_capacity: usize,
  stop: StopSignal,
}

impl<A: Actuator> ActuatorController<A> {
  pub fn new(actuator: A, stop: StopSignal) -> Self {
    Self {
      actuator,
      timing: ActuationTiming::default(),
      retry: Backoff::new(Duration::from_millis(100), Duration::from_secs(2), 3),
      queue_capacity: DEFAULT_QUEUE_CAPACITY,
      stop,
    }
  }

  pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
    self.queue_capacity = capacity.max(1);
    self
  }

  pub fn with_timing(mut self, timing: ActuationTiming) -> Self {
    self.timing = timing;
    self
  }

  pub fn with_retry(mut self, retry: Backoff) -> Self {
    self.retry = retry;
    self
  }

  // 最后一个等待结束前不返回
  fn execute(&mut self, command: ActuatorCommand) -> Outcome {
    for step in self.timing.steps(command) {
      match step {
        Step::Wait(duration) => {
          if self.stop.wait(duration) {
            return Outcome::Interrupted;
          }
        }
        Step::Send(byte) => match self.send_with_retry(command, byte) {
          Outcome::Done => debug!("执行器已发送 {:?} ({})", byte as char, command.route),
          other => return other,
        },
      }
    }
    Outcome::Done
  }

  fn send_with_retry(&mut self, command: ActuatorCommand, byte: u8) -> Outcome {
    self.retry.reset();
    loop {
      match self.actuator.write_byte(byte) {
        Ok(()) => return Outcome::Done,
        Err(e) => {
          if self.retry.attempts() >= self.retry.max_retries() {
            return Outcome::Failed(ActuatorFault {
              command,
              attempts: self.retry.attempts() + 1,
              message: e.to_string(),
            });
          }
          let delay = self.retry.next_delay();
          warn!(
            "执行器写入失败 (第 {} 次): {}，{:?} 后重试",
            self.retry.attempts(),
            e,
            delay
          );
          if self.stop.wait(delay) {
            return Outcome::Interrupted;
          }
        }
      }
    }
  }

  pub fn close(mut self) {
    match self.actuator.close() {
      Ok(()) => info!("执行器链路已关闭"),
      Err(e) => error!("关闭执行器链路失败: {}", e),
    }
  }
}

// 分拣循环只负责入队，节拍等待全部在工作线程里完成
pub struct ActuatorWorker {
  tx: Option<SyncSender<ActuatorCommand>>,
  faults: Receiver<ActuatorFault>,
  handle: Option<JoinHandle<()>>,
  dropped: AtomicU64,
}

impl ActuatorWorker {
  pub fn spawn<A: Actuator + 'static>(
    controller: ActuatorController<A>,
  ) -> Result<Self, ActuatorError> {
    let (tx, rx) = mpsc::sync_channel::<ActuatorCommand>(controller.queue_capacity);
    let (fault_tx, faults) = mpsc::channel();

    let handle = thread::Builder::new()
      .name("actuator".into())
      .spawn(move || run_worker(controller, rx, fault_tx))?;

    Ok(Self {
      tx: Some(tx),
      faults,
      handle: Some(handle),
      dropped: AtomicU64::new(0),
    })
  }

  /// 入队一条命令；队列已满时丢弃该命令并计数，不阻塞分拣循环
  pub fn submit(&self, command: ActuatorCommand) -> Result<(), ActuatorError> {
    let tx = self.tx.as_ref().ok_or(ActuatorError::QueueClosed)?;
    match tx.try_send(command) {
      Ok(()) => Ok(()),
      Err(TrySendError::Full(command)) => {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
          "执行器命令队列已满，丢弃 {} 命令 (累计丢弃 {} 条)",
          command.route, dropped
        );
        Ok(())
      }
      Err(TrySendError::Disconnected(_)) => Err(ActuatorError::QueueClosed),
    }
  }

  pub fn dropped(&self) -> u64 {
    self.dropped.load(Ordering::Relaxed)
  }

  pub fn drain_faults(&self) -> Vec<ActuatorFault> {
    self.faults.try_iter().collect()
  }

  pub fn shutdown(mut self) -> Vec<ActuatorFault> {
    self.tx.take();
    if let Some(handle) = self.handle.take()
      && handle.join().is_err()
    {
      error!("执行器工作线程异常退出");
    }
    self.drain_faults()
  }
}

impl Drop for ActuatorWorker {
  fn drop(&mut self) {
    self.tx.take();
    if let Some(handle) = self.handle.take() {
      let _ = handle.join();
    }
  }
}

fn run_worker<A: Actuator>(
  mut controller: ActuatorController<A>,
  rx: Receiver<ActuatorCommand>,
  faults: mpsc::Sender<ActuatorFault>,
) {
  info!("执行器工作线程启动");
  while let Ok(command) = rx.recv() {
    if controller.stop.is_stopped() {
      let discarded = 1 + rx.try_iter().count();
      warn!("收到停止信号，丢弃 {} 条未执行的命令", discarded);
      break;
    }
    match controller.execute(command) {
      Outcome::Done => {}
      Outcome::Interrupted => {
        let discarded = rx.try_iter().count();
        warn!(
          "执行器动作被停止信号中断，丢弃 {} 条未执行的命令",
          discarded
        );
        break;
      }
      Outcome::Failed(fault) => {
        error!(
          "执行器命令 {:?} 在 {} 次尝试后仍失败，已丢弃: {}",
          fault.command.route, fault.attempts, fault.message
        );
        let _ = faults.send(fault);
      }
    }
  }
  controller.close();
  info!("执行器工作线程退出");
}

pub enum ActuatorWrapper {
  Serial(SerialActuator),
  DryRun(DryRunActuator),
}

impl FromUrl for ActuatorWrapper {
  type Error = ActuatorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SerialActuator::SCHEME => Ok(ActuatorWrapper::Serial(SerialActuator::from_url(url)?)),
      DryRunActuator::SCHEME => Ok(ActuatorWrapper::DryRun(DryRunActuator::from_url(url)?)),
      other => Err(ActuatorError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Actuator for ActuatorWrapper {
  type Error = ActuatorError;

  fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
    match self {
      ActuatorWrapper::Serial(inner) => inner.write_byte(byte),
      ActuatorWrapper::DryRun(inner) => inner.write_byte(byte),
    }
  }

  fn close(&mut self) -> Result<(), Self::Error> {
    match self {
      ActuatorWrapper::Serial(inner) => inner.close(),
      ActuatorWrapper::DryRun(inner) => inner.close(),
    }
  }
}
