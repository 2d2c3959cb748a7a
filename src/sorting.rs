// 该文件是 Fenjian （分拣） 项目的一部分。
// src/sorting.rs - 类别目录与有机/无机分类
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

use std::{collections::HashSet, fmt, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const ORGANIC_CLASSES: [&str; 21] = [
  "banana", "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut",
  "cake", "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe",
  "person",
];

pub const INORGANIC_CLASSES: [&str; 57] = [
  "bicycle",
  "car",
  "motorbike",
  "aeroplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "chair",
  "sofa",
  "pottedplant",
  "bed",
  "diningtable",
  "toilet",
  "tvmonitor",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
  Organic,
  Inorganic,
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Category::Organic => write!(f, "Organic"),
      Category::Inorganic => write!(f, "Inorganic"),
    }
  }
}

#[derive(Error, Debug)]
pub enum CatalogError {
  #[error("读取类别文件失败: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别文件为空")]
  Empty,
  #[error("类别同时属于有机与无机集合: {0:?}")]
  Overlap(Vec<String>),
}

/// 类别目录，行号即类别 ID
#[derive(Debug, Clone)]
pub struct ClassCatalog {
  names: Box<[String]>,
}

impl ClassCatalog {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let catalog = Self::parse(&text)?;
    info!("加载类别文件: {}，共 {} 个类别", path.display(), catalog.len());
    Ok(catalog)
  }

  pub fn parse(text: &str) -> Result<Self, CatalogError> {
    let trimmed = text.trim_end_matches(&['\n', '\r'][..]);
    if trimmed.is_empty() {
      return Err(CatalogError::Empty);
    }
    let names = trimmed
      .split('\n')
      .map(|line| line.trim_end_matches('\r').to_string())
      .collect::<Vec<_>>();
    Ok(Self {
      names: names.into_boxed_slice(),
    })
  }

  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      names: names.into_iter().map(Into::into).collect(),
    }
  }

  pub fn name(&self, class_id: usize) -> Option<&str> {
    self.names.get(class_id).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }
}

#[derive(Debug, Clone)]
pub struct CategorySets {
  organic: HashSet<String>,
  inorganic: HashSet<String>,
}

impl Default for CategorySets {
  fn default() -> Self {
    Self {
      organic: ORGANIC_CLASSES.iter().map(|s| s.to_string()).collect(),
      inorganic: INORGANIC_CLASSES.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl CategorySets {
  pub fn new<I, J, S>(organic: I, inorganic: J) -> Result<Self, CatalogError>
  where
    I: IntoIterator<Item = S>,
    J: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let sets = Self {
      organic: organic.into_iter().map(Into::into).collect(),
      inorganic: inorganic.into_iter().map(Into::into).collect(),
    };
    let mut overlap = sets
      .organic
      .intersection(&sets.inorganic)
      .cloned()
      .collect::<Vec<_>>();
    if !overlap.is_empty() {
      overlap.sort();
      return Err(CatalogError::Overlap(overlap));
    }
    Ok(sets)
  }

  // 先查有机集合，再查无机集合
  pub fn classify(&self, name: &str) -> Option<Category> {
    if self.organic.contains(name) {
      Some(Category::Organic)
    } else if self.inorganic.contains(name) {
      Some(Category::Inorganic)
    } else {
      None
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Routable { name: String, category: Category },
  // 类别名不在任何集合中
  Unroutable { name: String },
  // 类别 ID 超出目录范围
  UnknownId { class_id: usize },
}

#[derive(Debug, Clone)]
pub struct Classifier {
  catalog: ClassCatalog,
  sets: CategorySets,
}

impl Classifier {
  pub fn new(catalog: ClassCatalog, sets: CategorySets) -> Self {
    let unassigned = catalog
      .iter()
      .filter(|name| sets.classify(name).is_none())
      .collect::<Vec<_>>();
    if !unassigned.is_empty() {
      warn!("以下类别不属于任何分拣集合，检测到时将不会驱动执行器: {:?}", unassigned);
    }
    Self { catalog, sets }
  }

  pub fn catalog(&self) -> &ClassCatalog {
    &self.catalog
  }

  pub fn classify(&self, class_id: usize) -> Verdict {
    match self.catalog.name(class_id) {
      Some(name) => match self.sets.classify(name) {
        Some(category) => Verdict::Routable {
          name: name.to_string(),
          category,
        },
        None => Verdict::Unroutable {
          name: name.to_string(),
        },
      },
      None => Verdict::UnknownId { class_id },
    }
  }
}
