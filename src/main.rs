// 该文件是 Fenjian （分拣） 项目的一部分。
// src/main.rs - 分拣控制器主程序
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

mod args;

use std::{sync::mpsc::RecvTimeoutError, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use fenjian::{
  FromUrl, FromUrlWithScheme,
  actuator::{ActuatorWrapper, DryRunActuator, SerialActuator},
  console::{self, CONFIRM_QUIT, Console, ConsoleEvent, HELP, Reaction},
  input::InputWrapper,
  logging::init_logging,
  model::{RknnModel, RknnModelBuilder},
  observer::SharedStatus,
  output::{OutputWrapper, RenderObserver, draw::Draw},
  sorting::{CategorySets, ClassCatalog, Classifier},
  tally::SnapshotStore,
  task::{LoopState, SortingController, SortingLoop},
};

type Controller = SortingController<InputWrapper, RknnModel, ActuatorWrapper>;

fn main() -> Result<()> {
  let args = args::Args::parse();
  let config = args.config();

  init_logging(&config.log_path)
    .with_context(|| format!("无法初始化日志 {}", config.log_path.display()))?;
  config.validate()?;

  info!("摄像头地址: {}", config.frame_url);
  info!("模型地址: {}", config.model_url);
  info!("执行器链路: {}", config.actuator_url);
  info!("显示输出: {}", config.output_url);
  info!("统计快照: {}", config.snapshot_path.display());

  let catalog = ClassCatalog::load(&config.catalog_path)
    .with_context(|| format!("无法加载类别目录 {}", config.catalog_path.display()))?;
  info!("已加载 {} 个类别", catalog.len());
  let classifier = Classifier::new(catalog.clone(), CategorySets::default());

  let model = RknnModelBuilder::from_url(&config.model_url)?
    .input_size(config.input_size, config.input_size)
    .num_classes(catalog.len())
    .build()
    .context("无法加载检测模型")?;

  let source = InputWrapper::open(&config.frame_url, config.fetch_timeout)?;
  let actuator = ActuatorWrapper::from_url(&config.actuator_url)
    .with_context(|| format!("无法打开执行器链路 {}", config.actuator_url))?;
  match &actuator {
    ActuatorWrapper::Serial(_) => info!("使用 {} 链路", SerialActuator::SCHEME),
    ActuatorWrapper::DryRun(_) => warn!("使用 {} 链路，不会驱动真实硬件", DryRunActuator::SCHEME),
  }
  let output = OutputWrapper::from_url(&config.output_url)?;

  let mut draw = Draw::default();
  if let Some(font) = &config.font_path {
    draw = draw
      .with_font_file(font)
      .with_context(|| format!("无法加载字体 {}", font.display()))?;
  }

  let store = SnapshotStore::new(&config.snapshot_path);
  let status = SharedStatus::new();

  let mut sorting_loop = SortingLoop::new(source, model, classifier, actuator, store.clone())
    .with_post_process(config.post_process())
    .with_fetch_backoff(config.fetch_backoff())
    .with_draw(draw)
    .observe(RenderObserver::new(output))
    .observe(status.clone());

  if args.resume {
    match store.load() {
      Ok(tally) => {
        info!("从快照恢复统计: 累计 {} 件", tally.total());
        sorting_loop = sorting_loop.with_tally(tally);
      }
      Err(e) => warn!("无法读取快照 {}，从零开始: {}", store.path().display(), e),
    }
  }

  let mut controller =
    SortingController::new(sorting_loop).with_startup_delay(config.startup_delay);

  let events = console::spawn_event_source()?;
  let mut console = Console::new();
  println!("Fenjian 垃圾分拣控制器");
  println!("======================");
  println!("{}", HELP);

  if args.autostart {
    start(&mut controller);
  }

  loop {
    let event = match events.recv_timeout(Duration::from_millis(500)) {
      Ok(event) => event,
      Err(RecvTimeoutError::Timeout) => {
        if controller.is_finished() {
          error!("分拣线程已退出");
          break;
        }
        continue;
      }
      Err(RecvTimeoutError::Disconnected) => ConsoleEvent::Closed,
    };

    match console.handle(event) {
      Reaction::Start => start(&mut controller),
      Reaction::ConfirmQuit => println!("{}", CONFIRM_QUIT),
      Reaction::Quit => break,
      Reaction::Stay => println!("已取消退出"),
      Reaction::Status => print_status(&controller, &status),
      Reaction::Help => println!("{}", HELP),
      Reaction::Unknown(cmd) => println!("未知命令 '{}'\n{}", cmd, HELP),
    }
  }

  console::arm_force_exit(Duration::from_secs(30));
  if let Some(summary) = controller.stop()? {
    info!(
      "共完成 {} 个周期，累计分拣 {} 件",
      summary.cycles,
      summary.tally.total()
    );
  }
  info!("程序退出");
  Ok(())
}

fn start(controller: &mut Controller) {
  match controller.start() {
    Ok(()) => println!("分拣已启动"),
    Err(e) => warn!("无法启动分拣: {}", e),
  }
}

fn print_status(controller: &Controller, status: &SharedStatus) {
  let state = match controller.state() {
    LoopState::Idle => "待机",
    LoopState::Running => "运行中",
    LoopState::Stopped => "已停止",
  };
  println!("状态: {}", state);
  println!("已完成周期: {}", status.cycles());
  println!("累计分拣: {}", status.sorted());
  for (name, count) in status.last_delta() {
    println!("  上个周期 {}: +{}", name, count);
  }
  let faults = status.faults();
  if !faults.is_empty() {
    println!("故障 {} 条，最近一条: {:?}", faults.len(), faults[faults.len() - 1]);
  }
}
