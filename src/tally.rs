// 该文件是 Fenjian （分拣） 项目的一部分。
// src/tally.rs - 分拣计数与快照持久化
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
  collections::BTreeMap,
  io::Write,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::sorting::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
  pub count: u64,
  #[serde(rename = "type")]
  pub category: Category,
}

pub type TallyDelta = BTreeMap<String, u64>;

/// 类别名到累计数量的映射，只增不减
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally {
  entries: BTreeMap<String, TallyEntry>,
}

impl Tally {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&mut self, name: &str, category: Category) -> u64 {
    let entry = self
      .entries
      .entry(name.to_string())
      .or_insert(TallyEntry { count: 0, category });
    entry.count += 1;
    entry.category = category;
    entry.count
  }

  pub fn get(&self, name: &str) -> Option<&TallyEntry> {
    self.entries.get(name)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn total(&self) -> u64 {
    self.entries.values().map(|e| e.count).sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &TallyEntry)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }
}

#[derive(Error, Debug)]
pub enum SnapshotError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
  path: PathBuf,
}

impl SnapshotStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// 先写入同目录临时文件再重命名，读者只会看到完整的快照
  pub fn persist(&self, tally: &Tally) -> Result<(), SnapshotError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    tally.serialize(&mut ser)?;

    let tmp = self.path.with_extension("json.tmp");
    {
      let mut file = std::fs::File::create(&tmp)?;
      file.write_all(&buf)?;
      file.sync_all()?;
    }
    std::fs::rename(&tmp, &self.path)?;

    debug!("快照已写入: {} ({} 个类别)", self.path.display(), tally.len());
    Ok(())
  }

  pub fn load(&self) -> Result<Tally, SnapshotError> {
    let text = std::fs::read_to_string(&self.path)?;
    Ok(serde_json::from_str(&text)?)
  }
}
