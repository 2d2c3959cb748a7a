// 该文件是 Fenjian （分拣） 项目的一部分。
// src/task.rs - 分拣循环与状态机
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
  fmt::Display,
  thread::{self, JoinHandle},
  time::{Duration, Instant},
};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  actuator::{
    ActuationTiming, Actuator, ActuatorCommand, ActuatorController, ActuatorError,
    ActuatorWorker,
  },
  frame::RgbNhwcFrame,
  input::FrameSource,
  model::{Detection, Model},
  observer::{CycleObserver, CycleReport, Fault, SortedDetection},
  output::draw::Draw,
  postprocess::PostProcess,
  sorting::{Classifier, Verdict},
  tally::{SnapshotStore, Tally, TallyDelta},
  utils::{Backoff, StopSignal},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
  Idle,
  Running,
  Stopped,
}

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("状态转换无效: {from:?} -> {to:?}")]
  InvalidTransition { from: LoopState, to: LoopState },
  #[error("推理失败: {0}")]
  Inference(String),
  #[error("执行器错误: {0}")]
  Actuator(#[from] ActuatorError),
  #[error("线程错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("分拣线程异常退出")]
  Panicked,
  #[error("启动延迟期间收到停止信号")]
  StoppedBeforeStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
  Completed { detections: usize },
  // 取帧失败
  Skipped,
}

#[derive(Debug, Clone)]
pub struct LoopSummary {
  pub cycles: u64,
  pub skipped: u64,
  pub tally: Tally,
}

// 未分配类别的检测不驱动执行器，也不计入统计
pub fn sort_detections<F>(
  detections: Vec<Detection>,
  classifier: &Classifier,
  tally: &mut Tally,
  mut dispatch: F,
) -> Result<(Vec<SortedDetection>, TallyDelta), ActuatorError>
where
  F: FnMut(ActuatorCommand) -> Result<(), ActuatorError>,
{
  let mut sorted = Vec::with_capacity(detections.len());
  let mut delta = TallyDelta::new();

  for detection in detections {
    match classifier.classify(detection.class_id) {
      Verdict::Routable { name, category } => {
        dispatch(ActuatorCommand::new(category))?;
        let count = tally.record(&name, category);
        *delta.entry(name.clone()).or_insert(0) += 1;
        debug!(
          "{} ({:.0}%) -> {}，累计 {}",
          name,
          detection.confidence * 100.0,
          category,
          count
        );
        sorted.push(SortedDetection {
          detection,
          name: Some(name),
          category: Some(category),
        });
      }
      Verdict::Unroutable { name } => {
        warn!("检测到未分配分拣类别的物体 {}，不驱动执行器", name);
        sorted.push(SortedDetection {
          detection,
          name: Some(name),
          category: None,
        });
      }
      Verdict::UnknownId { class_id } => {
        warn!("类别 ID {} 超出类别目录范围，忽略该检测", class_id);
        sorted.push(SortedDetection {
          detection,
          name: None,
          category: None,
        });
      }
    }
  }

  Ok((sorted, delta))
}

/// 后台分拣循环：取帧 → 推理 → 解码 → 抑制 → 分类/执行/计数 → 快照 → 显示
pub struct SortingLoop<S, M, A: Actuator> {
  source: S,
  model: M,
  classifier: Classifier,
  post: PostProcess,
  actuator: ActuatorController<A>,
  tally: Tally,
  store: SnapshotStore,
  draw: Draw,
  observers: Vec<Box<dyn CycleObserver>>,
  fetch_backoff: Backoff,
  stop: StopSignal,
  cycles: u64,
  skipped: u64,
}

impl<S, M, A> SortingLoop<S, M, A>
where
  S: FrameSource,
  M: Model,
  M::Error: Display,
  A: Actuator + 'static,
{
  pub fn new(source: S, model: M, classifier: Classifier, actuator: A, store: SnapshotStore) -> Self {
    let stop = StopSignal::new();
    Self {
      source,
      model,
      classifier,
      post: PostProcess::default(),
      actuator: ActuatorController::new(actuator, stop.clone()),
      tally: Tally::new(),
      store,
      draw: Draw::default(),
      observers: Vec::new(),
      fetch_backoff: Backoff::new(Duration::from_millis(100), Duration::from_secs(10), 10),
      stop,
      cycles: 0,
      skipped: 0,
    }
  }

  pub fn with_post_process(mut self, post: PostProcess) -> Self {
    self.post = post;
    self
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn with_fetch_backoff(mut self, backoff: Backoff) -> Self {
    self.fetch_backoff = backoff;
    self
  }

  pub fn with_actuation_timing(mut self, timing: ActuationTiming) -> Self {
    self.actuator = self.actuator.with_timing(timing);
    self
  }

  pub fn with_actuator_retry(mut self, retry: Backoff) -> Self {
    self.actuator = self.actuator.with_retry(retry);
    self
  }

  pub fn with_actuator_queue(mut self, capacity: usize) -> Self {
    self.actuator = self.actuator.with_queue_capacity(capacity);
    self
  }

  // 从上次的快照恢复时使用
  pub fn with_tally(mut self, tally: Tally) -> Self {
    self.tally = tally;
    self
  }

  pub fn observe(mut self, observer: impl CycleObserver + 'static) -> Self {
    self.observers.push(Box::new(observer));
    self
  }

  pub fn stop_signal(&self) -> StopSignal {
    self.stop.clone()
  }

  pub fn tally(&self) -> &Tally {
    &self.tally
  }

  pub fn close(self) {
    self.actuator.close();
  }

  fn into_parts(self) -> (LoopCore<S, M>, ActuatorController<A>) {
    let SortingLoop {
      source,
      model,
      classifier,
      post,
      actuator,
      tally,
      store,
      draw,
      observers,
      fetch_backoff,
      stop,
      cycles,
      skipped,
    } = self;
    let core = LoopCore {
      source,
      model,
      classifier,
      post,
      tally,
      store,
      draw,
      observers,
      fetch_backoff,
      stop,
      cycles,
      skipped,
    };
    (core, actuator)
  }

  pub fn run(self) -> Result<LoopSummary, TaskError> {
    let (mut core, actuator) = self.into_parts();
    let worker = ActuatorWorker::spawn(actuator)?;

    info!("分拣循环启动");
    let result = core.run_until_stopped(&worker);
    if let Err(e) = &result {
      error!("分拣循环因错误退出: {}", e);
      // 积压的命令不再对应传送带上的物体
      core.stop.stop();
    }

    for fault in worker.shutdown() {
      core.notify_fault(Fault::Actuator(fault));
    }
    info!(
      "分拣循环退出：完成 {} 个周期，跳过 {} 个，累计分拣 {} 件",
      core.cycles,
      core.skipped,
      core.tally.total()
    );

    result.map(|()| LoopSummary {
      cycles: core.cycles,
      skipped: core.skipped,
      tally: core.tally,
    })
  }
}

struct LoopCore<S, M> {
  source: S,
  model: M,
  classifier: Classifier,
  post: PostProcess,
  tally: Tally,
  store: SnapshotStore,
  draw: Draw,
  observers: Vec<Box<dyn CycleObserver>>,
  fetch_backoff: Backoff,
  stop: StopSignal,
  cycles: u64,
  skipped: u64,
}

impl<S, M> LoopCore<S, M>
where
  S: FrameSource,
  M: Model,
  M::Error: Display,
{
  fn run_until_stopped(&mut self, worker: &ActuatorWorker) -> Result<(), TaskError> {
    while !self.stop.is_stopped() {
      self.run_cycle(worker)?;
      for fault in worker.drain_faults() {
        self.notify_fault(Fault::Actuator(fault));
      }
    }
    Ok(())
  }

  fn run_cycle(&mut self, worker: &ActuatorWorker) -> Result<CycleOutcome, TaskError> {
    let started = Instant::now();
    let captured_at = Local::now();

    let mut image = match self.source.fetch() {
      Ok(image) => {
        self.fetch_backoff.reset();
        image
      }
      Err(e) => {
        self.on_fetch_failure(&e);
        self.skipped += 1;
        return Ok(CycleOutcome::Skipped);
      }
    };

    let (input_w, input_h) = self.model.input_size();
    let input = RgbNhwcFrame::from_image_resized(&image, input_w, input_h);
    let rows = self
      .model
      .infer(&input)
      .map_err(|e| TaskError::Inference(e.to_string()))?;

    let detections = self.post.run(&rows, image.width(), image.height());
    let (sorted, delta) = sort_detections(detections, &self.classifier, &mut self.tally, |cmd| {
      worker.submit(cmd)
    })?;

    // 一个周期的全部检测计入后才写快照
    if let Err(e) = self.store.persist(&self.tally) {
      error!("写入快照 {} 失败，下个周期重试: {}", self.store.path().display(), e);
      self.notify_fault(Fault::Snapshot {
        message: e.to_string(),
      });
    }

    self.draw.draw_detections(&mut image, &sorted);

    self.cycles += 1;
    let report = CycleReport {
      index: self.cycles,
      captured_at,
      frame: image,
      unroutable: sorted.iter().filter(|s| s.category.is_none()).count(),
      detections: sorted,
      delta,
      elapsed: started.elapsed(),
    };
    debug!(
      "第 {} 周期完成: {} 个检测，耗时 {:.2?}",
      report.index,
      report.detections.len(),
      report.elapsed
    );

    for observer in self.observers.iter_mut() {
      observer.on_cycle(&report);
    }

    Ok(CycleOutcome::Completed {
      detections: report.detections.len(),
    })
  }

  fn on_fetch_failure(&mut self, e: &dyn std::error::Error) {
    error!("获取图像失败: {}", e);
    let delay = self.fetch_backoff.next_delay();
    let consecutive = self.fetch_backoff.attempts();
    if consecutive.checked_rem(self.fetch_backoff.max_retries()) == Some(0) {
      error!("已连续 {} 次获取图像失败，请检查摄像头与网络", consecutive);
      self.notify_fault(Fault::Fetch {
        consecutive,
        message: e.to_string(),
      });
    }
    debug!("{:?} 后重试取帧", delay);
    self.stop.wait(delay);
  }

  fn notify_fault(&mut self, fault: Fault) {
    for observer in self.observers.iter_mut() {
      observer.on_fault(&fault);
    }
  }
}

/// 前台使用的状态机：Idle → Running → Stopped
pub struct SortingController<S, M, A: Actuator> {
  state: LoopState,
  pending: Option<SortingLoop<S, M, A>>,
  stop: StopSignal,
  startup_delay: Duration,
  handle: Option<JoinHandle<Result<LoopSummary, TaskError>>>,
}

impl<S, M, A> SortingController<S, M, A>
where
  S: FrameSource + Send + 'static,
  M: Model + Send + 'static,
  M::Error: Display,
  A: Actuator + 'static,
{
  pub fn new(sorting_loop: SortingLoop<S, M, A>) -> Self {
    Self {
      state: LoopState::Idle,
      stop: sorting_loop.stop_signal(),
      pending: Some(sorting_loop),
      startup_delay: Duration::from_secs(1),
      handle: None,
    }
  }

  pub fn with_startup_delay(mut self, delay: Duration) -> Self {
    self.startup_delay = delay;
    self
  }

  pub fn state(&self) -> LoopState {
    self.state
  }

  pub fn stop_signal(&self) -> StopSignal {
    self.stop.clone()
  }

  pub fn start(&mut self) -> Result<(), TaskError> {
    if self.state != LoopState::Idle {
      return Err(TaskError::InvalidTransition {
        from: self.state,
        to: LoopState::Running,
      });
    }
    let Some(sorting_loop) = self.pending.take() else {
      return Err(TaskError::InvalidTransition {
        from: self.state,
        to: LoopState::Running,
      });
    };

    info!("{:?} 后启动分拣循环", self.startup_delay);
    if self.stop.wait(self.startup_delay) {
      sorting_loop.close();
      self.state = LoopState::Stopped;
      return Err(TaskError::StoppedBeforeStart);
    }

    let handle = thread::Builder::new()
      .name("sorting-loop".into())
      .spawn(move || sorting_loop.run())?;
    self.handle = Some(handle);
    self.state = LoopState::Running;
    Ok(())
  }

  // 执行器链路恰好关闭一次
  pub fn stop(&mut self) -> Result<Option<LoopSummary>, TaskError> {
    match self.state {
      LoopState::Stopped => Ok(None),
      LoopState::Idle => {
        info!("分拣循环未启动，直接关闭");
        self.stop.stop();
        if let Some(sorting_loop) = self.pending.take() {
          sorting_loop.close();
        }
        self.state = LoopState::Stopped;
        Ok(None)
      }
      LoopState::Running => {
        info!("正在停止分拣循环...");
        self.stop.stop();
        self.state = LoopState::Stopped;
        match self.handle.take() {
          Some(handle) => match handle.join() {
            Ok(result) => result.map(Some),
            Err(_) => Err(TaskError::Panicked),
          },
          None => Ok(None),
        }
      }
    }
  }

  pub fn is_finished(&self) -> bool {
    self.handle.as_ref().is_some_and(|h| h.is_finished())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::{BBox, RawPrediction},
    observer::SharedStatus,
    sorting::{Category, CategorySets, ClassCatalog},
  };
  use image::RgbImage;
  use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
  };

  #[derive(Debug, thiserror::Error)]
  #[error("camera offline")]
  struct Offline;

  struct Script(VecDeque<Result<RgbImage, Offline>>);

  impl FrameSource for Script {
    type Error = Offline;

    fn fetch(&mut self) -> Result<RgbImage, Self::Error> {
      self.0.pop_front().unwrap_or(Err(Offline))
    }
  }

  struct Rows(Mutex<VecDeque<Vec<RawPrediction>>>);

  impl Model for Rows {
    type Error = std::io::Error;

    fn input_size(&self) -> (u32, u32) {
      (16, 16)
    }

    fn infer(&self, _input: &RgbNhwcFrame) -> Result<Vec<RawPrediction>, Self::Error> {
      Ok(self.0.lock().unwrap().pop_front().unwrap_or_default())
    }
  }

  #[derive(Clone, Default)]
  struct Bytes(Arc<Mutex<Vec<u8>>>);

  impl Actuator for Bytes {
    type Error = std::io::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
      self.0.lock().unwrap().push(byte);
      Ok(())
    }
  }

  fn classifier() -> Classifier {
    Classifier::new(
      ClassCatalog::from_names(["apple", "car", "toothbrush"]),
      CategorySets::default(),
    )
  }

  fn row(cx: f32, class_id: usize, score: f32) -> RawPrediction {
    let mut values = vec![cx, 0.5, 0.1, 0.1, 1.0, 0.0, 0.0, 0.0];
    values[RawPrediction::SCORE_OFFSET + class_id] = score;
    RawPrediction::from_row(&values).unwrap()
  }

  fn detection(class_id: usize) -> Detection {
    Detection {
      bbox: BBox {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
      },
      class_id,
      confidence: 0.9,
    }
  }

  #[test]
  fn sort_detections_folds_one_cycle() {
    let mut tally = Tally::new();
    let mut commands = Vec::new();
    let (sorted, delta) = sort_detections(
      vec![detection(0), detection(0), detection(1), detection(2)],
      &classifier(),
      &mut tally,
      |cmd| {
        commands.push(cmd.byte());
        Ok(())
      },
    )
    .unwrap();

    assert_eq!(commands, b"112".to_vec());
    assert_eq!(sorted.len(), 4);
    assert_eq!(sorted[3].category, None);
    assert_eq!(delta.get("apple"), Some(&2));
    assert_eq!(delta.get("car"), Some(&1));
    assert_eq!(tally.len(), 2);
    assert_eq!(tally.get("apple").unwrap().count, 2);
    assert_eq!(tally.get("apple").unwrap().category, Category::Organic);
    assert_eq!(tally.get("car").unwrap().count, 1);
    assert_eq!(tally.get("toothbrush"), None);
  }

  #[test]
  fn dispatch_failure_propagates() {
    let mut tally = Tally::new();
    let result = sort_detections(vec![detection(0)], &classifier(), &mut tally, |_| {
      Err(ActuatorError::QueueClosed)
    });
    assert!(matches!(result, Err(ActuatorError::QueueClosed)));
  }

  #[test]
  fn fetch_failure_leaves_tally_and_snapshot_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    let frame = RgbImage::new(100, 100);
    let source = Script(VecDeque::from([Ok(frame.clone()), Err(Offline), Ok(frame)]));
    let model = Rows(Mutex::new(VecDeque::from([
      vec![row(0.2, 0, 0.9)],
      vec![row(0.2, 0, 0.9)],
    ])));
    let bytes = Bytes::default();

    let sorting_loop = SortingLoop::new(source, model, classifier(), bytes.clone(), store.clone())
      .with_fetch_backoff(Backoff::new(
        Duration::from_millis(1),
        Duration::from_millis(2),
        5,
      ))
      .with_actuation_timing(ActuationTiming {
        settle: Duration::ZERO,
        inorganic_travel: Duration::ZERO,
      });
    let (mut core, actuator) = sorting_loop.into_parts();
    let worker = ActuatorWorker::spawn(actuator).unwrap();

    assert_eq!(
      core.run_cycle(&worker).unwrap(),
      CycleOutcome::Completed { detections: 1 }
    );
    let after_first = std::fs::read_to_string(store.path()).unwrap();
    let tally_first = core.tally.clone();

    assert_eq!(core.run_cycle(&worker).unwrap(), CycleOutcome::Skipped);
    assert_eq!(core.tally, tally_first);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), after_first);

    assert_eq!(
      core.run_cycle(&worker).unwrap(),
      CycleOutcome::Completed { detections: 1 }
    );
    assert_eq!(core.tally.get("apple").unwrap().count, 2);
    assert_eq!((core.cycles, core.skipped), (2, 1));

    worker.shutdown();
    assert_eq!(*bytes.0.lock().unwrap(), b"11".to_vec());
  }

  #[test]
  fn controller_rejects_double_start_and_stops_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    let source = Script(VecDeque::new());
    let model = Rows(Mutex::new(VecDeque::new()));
    let sorting_loop = SortingLoop::new(source, model, classifier(), Bytes::default(), store)
      .with_fetch_backoff(Backoff::new(
        Duration::from_millis(5),
        Duration::from_millis(10),
        3,
      ));
    let mut controller =
      SortingController::new(sorting_loop).with_startup_delay(Duration::from_millis(10));

    assert_eq!(controller.state(), LoopState::Idle);
    controller.start().unwrap();
    assert_eq!(controller.state(), LoopState::Running);
    assert!(matches!(
      controller.start(),
      Err(TaskError::InvalidTransition { .. })
    ));

    let summary = controller.stop().unwrap().unwrap();
    assert_eq!(summary.cycles, 0);
    assert!(summary.tally.is_empty());
    assert_eq!(controller.state(), LoopState::Stopped);
    assert!(controller.stop().unwrap().is_none());
  }

  #[test]
  fn quit_from_idle_never_starts() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    let sorting_loop = SortingLoop::new(
      Script(VecDeque::new()),
      Rows(Mutex::new(VecDeque::new())),
      classifier(),
      Bytes::default(),
      store.clone(),
    );
    let mut controller = SortingController::new(sorting_loop);
    assert!(controller.stop().unwrap().is_none());
    assert_eq!(controller.state(), LoopState::Stopped);
    assert!(matches!(
      controller.start(),
      Err(TaskError::InvalidTransition { .. })
    ));
    assert!(!store.path().exists());
  }

  fn instant() -> ActuationTiming {
    ActuationTiming {
      settle: Duration::ZERO,
      inorganic_travel: Duration::ZERO,
    }
  }

  #[test]
  fn failed_snapshot_is_reported_and_rewritten_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    // 父目录位置被普通文件占用，第一次写快照必然失败
    let blocker = dir.path().join("state");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let store = SnapshotStore::new(blocker.join("snapshot.json"));
    let frame = RgbImage::new(100, 100);
    let source = Script(VecDeque::from([Ok(frame.clone()), Ok(frame)]));
    let model = Rows(Mutex::new(VecDeque::from([
      vec![row(0.2, 0, 0.9)],
      vec![row(0.2, 1, 0.9)],
    ])));
    let status = SharedStatus::new();

    let sorting_loop = SortingLoop::new(source, model, classifier(), Bytes::default(), store.clone())
      .with_actuation_timing(instant())
      .observe(status.clone());
    let (mut core, actuator) = sorting_loop.into_parts();
    let worker = ActuatorWorker::spawn(actuator).unwrap();

    assert_eq!(
      core.run_cycle(&worker).unwrap(),
      CycleOutcome::Completed { detections: 1 }
    );
    let faults = status.faults();
    assert_eq!(faults.len(), 1);
    assert!(matches!(faults[0], Fault::Snapshot { .. }));
    assert_eq!(status.cycles(), 1);
    assert!(!store.path().exists());

    std::fs::remove_file(&blocker).unwrap();
    assert_eq!(
      core.run_cycle(&worker).unwrap(),
      CycleOutcome::Completed { detections: 1 }
    );
    worker.shutdown();

    let persisted = store.load().unwrap();
    assert_eq!(persisted.get("apple").unwrap().count, 1);
    assert_eq!(persisted.get("car").unwrap().count, 1);
    assert_eq!(status.faults().len(), 1);
  }

  #[test]
  fn zero_retry_limit_never_alerts() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    let status = SharedStatus::new();
    let sorting_loop = SortingLoop::new(
      Script(VecDeque::new()),
      Rows(Mutex::new(VecDeque::new())),
      classifier(),
      Bytes::default(),
      store,
    )
    .with_fetch_backoff(Backoff::new(Duration::from_millis(1), Duration::from_millis(1), 0))
    .observe(status.clone());
    let (mut core, actuator) = sorting_loop.into_parts();
    let worker = ActuatorWorker::spawn(actuator).unwrap();

    for _ in 0..3 {
      assert_eq!(core.run_cycle(&worker).unwrap(), CycleOutcome::Skipped);
    }
    worker.shutdown();
    assert!(status.faults().is_empty());
    assert_eq!(core.skipped, 3);
  }

  // 第一次推理返回给定的行，之后一直失败
  struct FailsAfterFirst(Mutex<Option<Vec<RawPrediction>>>);

  impl Model for FailsAfterFirst {
    type Error = std::io::Error;

    fn input_size(&self) -> (u32, u32) {
      (16, 16)
    }

    fn infer(&self, _input: &RgbNhwcFrame) -> Result<Vec<RawPrediction>, Self::Error> {
      self
        .0
        .lock()
        .unwrap()
        .take()
        .ok_or_else(|| std::io::Error::other("output tensor shape mismatch"))
    }
  }

  #[test]
  fn inference_error_discards_backlog_instead_of_playing_it_out() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    let frame = RgbImage::new(100, 100);
    let bytes = Bytes::default();
    // 四辆车，默认节拍下全部执行需要 6.4 秒
    let cars = vec![
      row(0.1, 1, 0.9),
      row(0.35, 1, 0.9),
      row(0.6, 1, 0.9),
      row(0.85, 1, 0.9),
    ];
    let sorting_loop = SortingLoop::new(
      Script(VecDeque::from([Ok(frame.clone()), Ok(frame)])),
      FailsAfterFirst(Mutex::new(Some(cars))),
      classifier(),
      bytes.clone(),
      store.clone(),
    );

    let start = Instant::now();
    let result = sorting_loop.run();
    assert!(matches!(result, Err(TaskError::Inference(_))));
    assert!(start.elapsed() < Duration::from_millis(1000));
    assert!(bytes.0.lock().unwrap().is_empty());
    assert_eq!(store.load().unwrap().get("car").unwrap().count, 4);
  }
}
