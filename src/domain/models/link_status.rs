// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// 单次探测失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// 收到了非 2xx 的HTTP响应
    HttpStatus(u16),
    /// 连接失败、协议错误等
    Transport(String),
    /// 单次尝试超时（毫秒）
    Timeout(u64),
}

impl ProbeFailure {
    /// 只有真正收到HTTP响应时才有状态码
    pub fn http_status_code(&self) -> Option<u16> {
        match self {
            ProbeFailure::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::HttpStatus(code) => write!(f, "Received HTTP status {}", code),
            ProbeFailure::Transport(message) => write!(f, "{}", message),
            ProbeFailure::Timeout(millis) => write!(f, "No response within {}ms", millis),
        }
    }
}

/// 链接状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// 链接可达；HTTP探测携带成功状态码，FTP等非HTTP探测没有状态码
    Active { http_status_code: Option<u16> },
    /// 重试耗尽后仍不可达，携带最后一次失败
    Broken { failure: ProbeFailure },
    /// 无法探测（缺少链接或协议未知），没有发起任何网络请求
    Unknown { reason: String },
}

impl LinkStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LinkStatus::Active { .. })
    }

    pub fn kind(&self) -> LinkStatusKind {
        match self {
            LinkStatus::Active { .. } => LinkStatusKind::Active,
            LinkStatus::Broken { .. } => LinkStatusKind::Broken,
            LinkStatus::Unknown { .. } => LinkStatusKind::Unknown,
        }
    }
}

/// 持久化的状态标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatusKind {
    Active,
    Broken,
    Unknown,
}

impl LinkStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatusKind::Active => "active",
            LinkStatusKind::Broken => "broken",
            LinkStatusKind::Unknown => "unknown",
        }
    }
}

/// `source-link-status` aspect
///
/// `http_status_code` 仅在HTTP请求收到响应时存在；`error_details` 仅在状态不是 active 时存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLinkAspect {
    pub status: LinkStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl From<&LinkStatus> for BrokenLinkAspect {
    fn from(status: &LinkStatus) -> Self {
        match status {
            LinkStatus::Active { http_status_code } => Self {
                status: LinkStatusKind::Active,
                http_status_code: *http_status_code,
                error_details: None,
            },
            LinkStatus::Broken { failure } => Self {
                status: LinkStatusKind::Broken,
                http_status_code: failure.http_status_code(),
                error_details: Some(failure.to_string()),
            },
            LinkStatus::Unknown { reason } => Self {
                status: LinkStatusKind::Unknown,
                http_status_code: None,
                error_details: Some(reason.clone()),
            },
        }
    }
}

/// 质量评分的一个组成部分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityRating {
    pub score: f64,
    pub weighting: f64,
}

/// JSON Patch 操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl JsonPatchOperation {
    /// 构造 `add` 操作
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: "add".to_string(),
            path: path.into(),
            value: Some(value),
        }
    }
}

impl QualityRating {
    /// 生成写入 `dataset-quality-rating` 的 patch，按评分组成部分的名称作为键
    pub fn to_patch(&self, component: &str) -> Vec<JsonPatchOperation> {
        vec![JsonPatchOperation::add(
            format!("/{}", component),
            json!({ "score": self.score, "weighting": self.weighting }),
        )]
    }
}
