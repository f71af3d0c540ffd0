// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// 数据集的分发列表
pub const DATASET_DISTRIBUTIONS: &str = "dataset-distributions";
/// 分发的 DCAT 字符串字段（downloadURL / accessURL 等）
pub const DCAT_DISTRIBUTION_STRINGS: &str = "dcat-distribution-strings";
/// 数据集的发布者
pub const DATASET_PUBLISHER: &str = "dataset-publisher";
/// 分发链接状态（写入目标）
pub const SOURCE_LINK_STATUS: &str = "source-link-status";
/// 数据集质量评分（写入目标）
pub const DATASET_QUALITY_RATING: &str = "dataset-quality-rating";

/// 注册中心记录
///
/// 由ID标识，携带若干个 aspect（独立定义结构的数据切片）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 记录ID
    pub id: String,
    /// 显示名称
    #[serde(default)]
    pub name: String,
    /// aspect ID 到数据的映射
    #[serde(default)]
    pub aspects: Map<String, Value>,
}

impl Record {
    /// 创建没有 aspect 的记录
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            aspects: Map::new(),
        }
    }

    /// 设置一个 aspect 并返回自身
    pub fn with_aspect(mut self, aspect_id: &str, data: Value) -> Self {
        self.aspects.insert(aspect_id.to_string(), data);
        self
    }

    /// 读取 aspect
    pub fn aspect(&self, aspect_id: &str) -> Option<&Value> {
        self.aspects.get(aspect_id)
    }

    /// 读取 `dataset-distributions` 中的分发
    ///
    /// 已解引用的分发以记录形式返回，未解引用的以ID形式返回。
    /// aspect 不存在时返回空列表。
    pub fn distribution_refs(&self) -> Vec<DistributionRef> {
        let Some(entries) = self
            .aspect(DATASET_DISTRIBUTIONS)
            .and_then(|aspect| aspect.get("distributions"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(DistributionRef::Id(id.clone())),
                Value::Object(_) => match serde_json::from_value::<Record>(entry.clone()) {
                    Ok(record) => Some(DistributionRef::Record(record)),
                    Err(e) => {
                        warn!("Skipping malformed distribution in {}: {}", self.id, e);
                        None
                    }
                },
                _ => {
                    warn!("Skipping unexpected distribution entry in {}", self.id);
                    None
                }
            })
            .collect()
    }

    /// 读取 `dcat-distribution-strings`
    ///
    /// 两个链接字段分别读取，某个字段不是字符串时只忽略该字段
    pub fn distribution_strings(&self) -> DistributionStrings {
        let Some(aspect) = self.aspect(DCAT_DISTRIBUTION_STRINGS) else {
            return DistributionStrings::default();
        };
        DistributionStrings {
            download_url: self.url_field(aspect, "downloadURL"),
            access_url: self.url_field(aspect, "accessURL"),
        }
    }

    fn url_field(&self, aspect: &Value, field: &str) -> Option<String> {
        match aspect.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(url.clone()),
            Some(other) => {
                warn!("Ignoring malformed {} of {}: {}", field, self.id, other);
                None
            }
        }
    }
}

/// 数据集中对分发的引用
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionRef {
    /// 已解引用的分发记录
    Record(Record),
    /// 仅有分发ID
    Id(String),
}

/// 分发的候选链接
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStrings {
    #[serde(rename = "downloadURL", default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(rename = "accessURL", default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
}

/// aspect 定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectDefinition {
    /// aspect ID
    pub id: String,
    /// 显示名称
    pub name: String,
    /// JSON Schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
}

impl AspectDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, json_schema: Option<Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            json_schema,
        }
    }
}
