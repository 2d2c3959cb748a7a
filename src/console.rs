// 该文件是 Fenjian （分拣） 项目的一部分。
// src/console.rs - 操作员控制台
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
  io::BufRead,
  sync::mpsc::{self, Receiver, Sender},
  thread,
  time::Duration,
};

use tracing::{info, warn};

pub const HELP: &str = "命令: start (s) 启动分拣 | status 查看状态 | quit (q) 退出 | help (?) 帮助";
pub const CONFIRM_QUIT: &str = "确定要退出吗? [y/N]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
  Line(String),
  Interrupt,
  // 标准输入关闭
  Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
  Start,
  ConfirmQuit,
  Quit,
  Stay,
  Status,
  Help,
  Unknown(String),
}

// 退出总是先经过一次确认
#[derive(Debug, Default)]
pub struct Console {
  confirming: bool,
}

impl Console {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_confirming(&self) -> bool {
    self.confirming
  }

  pub fn handle(&mut self, event: ConsoleEvent) -> Reaction {
    if self.confirming {
      self.confirming = false;
      return match event {
        ConsoleEvent::Line(line) => match line.trim().to_lowercase().as_str() {
          "y" | "yes" => Reaction::Quit,
          _ => Reaction::Stay,
        },
        // 确认期间再次 Ctrl-C 直接退出
        ConsoleEvent::Interrupt | ConsoleEvent::Closed => Reaction::Quit,
      };
    }

    match event {
      ConsoleEvent::Interrupt => {
        self.confirming = true;
        Reaction::ConfirmQuit
      }
      ConsoleEvent::Closed => Reaction::Quit,
      ConsoleEvent::Line(line) => match line.trim().to_lowercase().as_str() {
        "start" | "s" => Reaction::Start,
        "quit" | "q" | "exit" => {
          self.confirming = true;
          Reaction::ConfirmQuit
        }
        "status" => Reaction::Status,
        "help" | "?" | "" => Reaction::Help,
        other => Reaction::Unknown(other.to_string()),
      },
    }
  }
}

/// 把 Ctrl-C 与标准输入汇入同一个事件通道
pub fn spawn_event_source() -> anyhow::Result<Receiver<ConsoleEvent>> {
  let (tx, rx) = mpsc::channel();

  let interrupt_tx = tx.clone();
  ctrlc::set_handler(move || {
    info!("收到中断信号");
    let _ = interrupt_tx.send(ConsoleEvent::Interrupt);
  })?;

  thread::Builder::new()
    .name("console-stdin".into())
    .spawn(move || read_lines(std::io::stdin().lock(), tx))?;

  Ok(rx)
}

fn read_lines(input: impl BufRead, tx: Sender<ConsoleEvent>) {
  for line in input.lines() {
    match line {
      Ok(line) => {
        if tx.send(ConsoleEvent::Line(line)).is_err() {
          return;
        }
      }
      Err(e) => {
        warn!("读取标准输入失败: {}", e);
        break;
      }
    }
  }
  let _ = tx.send(ConsoleEvent::Closed);
}

pub fn arm_force_exit(after: Duration) {
  thread::spawn(move || {
    thread::sleep(after);
    warn!("强制退出程序");
    std::process::exit(1);
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(s: &str) -> ConsoleEvent {
    ConsoleEvent::Line(s.to_string())
  }

  #[test]
  fn start_and_help_commands() {
    let mut console = Console::new();
    assert_eq!(console.handle(line("start")), Reaction::Start);
    assert_eq!(console.handle(line(" S ")), Reaction::Start);
    assert_eq!(console.handle(line("")), Reaction::Help);
    assert_eq!(console.handle(line("status")), Reaction::Status);
    assert_eq!(
      console.handle(line("launch")),
      Reaction::Unknown("launch".into())
    );
  }

  #[test]
  fn quit_requires_confirmation() {
    let mut console = Console::new();
    assert_eq!(console.handle(line("q")), Reaction::ConfirmQuit);
    assert!(console.is_confirming());
    assert_eq!(console.handle(line("n")), Reaction::Stay);
    assert!(!console.is_confirming());

    assert_eq!(console.handle(line("quit")), Reaction::ConfirmQuit);
    assert_eq!(console.handle(line("Y")), Reaction::Quit);
  }

  #[test]
  fn interrupt_goes_through_same_confirmation() {
    let mut console = Console::new();
    assert_eq!(console.handle(ConsoleEvent::Interrupt), Reaction::ConfirmQuit);
    assert_eq!(console.handle(line("start")), Reaction::Stay);

    assert_eq!(console.handle(ConsoleEvent::Interrupt), Reaction::ConfirmQuit);
    assert_eq!(console.handle(ConsoleEvent::Interrupt), Reaction::Quit);
  }

  #[test]
  fn closed_stdin_quits() {
    let mut console = Console::new();
    assert_eq!(console.handle(ConsoleEvent::Closed), Reaction::Quit);
  }

  #[test]
  fn reader_forwards_lines_then_closed() {
    let (tx, rx) = mpsc::channel();
    read_lines(std::io::Cursor::new("start\nq\ny\n"), tx);
    let events = rx.try_iter().collect::<Vec<_>>();
    assert_eq!(
      events,
      vec![line("start"), line("q"), line("y"), ConsoleEvent::Closed]
    );
  }
}
