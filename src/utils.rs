// 该文件是 Fenjian （分拣） 项目的一部分。
// src/utils.rs - 停止信号与退避策略
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
  sync::{Arc, Condvar, Mutex, PoisonError},
  time::Duration,
};

/// 跨线程共享的停止信号
///
/// 所有可能长时间阻塞的等待（启动延迟、退避、执行器节拍）都通过
/// [`StopSignal::wait`] 完成，收到停止请求后立即返回。
#[derive(Clone, Default, Debug)]
pub struct StopSignal {
  inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn stop(&self) {
    let (lock, cvar) = &*self.inner;
    let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
    *stopped = true;
    cvar.notify_all();
  }

  pub fn is_stopped(&self) -> bool {
    let (lock, _) = &*self.inner;
    *lock.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// 等待 `timeout`，期间若收到停止请求则提前返回 `true`
  pub fn wait(&self, timeout: Duration) -> bool {
    let (lock, cvar) = &*self.inner;
    let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    let (guard, _) = cvar
      .wait_timeout_while(guard, timeout, |stopped| !*stopped)
      .unwrap_or_else(PoisonError::into_inner);
    *guard
  }
}

#[derive(Clone, Debug)]
pub struct Backoff {
  base: Duration,
  max: Duration,
  max_retries: u32,
  attempt: u32,
}

impl Backoff {
  pub fn new(base: Duration, max: Duration, max_retries: u32) -> Self {
    Self {
      base,
      max,
      max_retries,
      attempt: 0,
    }
  }

  /// 返回下一次重试前的等待时长，并累加失败次数
  pub fn next_delay(&mut self) -> Duration {
    let factor = 1u32.checked_shl(self.attempt.min(31)).unwrap_or(u32::MAX);
    let delay = self.base.saturating_mul(factor).min(self.max);
    self.attempt = self.attempt.saturating_add(1);
    delay
  }

  pub fn attempts(&self) -> u32 {
    self.attempt
  }

  pub fn exhausted(&self) -> bool {
    self.attempt >= self.max_retries
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }

  pub fn reset(&mut self) {
    self.attempt = 0;
  }
}
