// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 注册中心调用错误
///
/// 保存为纯数据（状态码与消息），以便在失败记录中克隆和比较
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("registry request failed: {0}")]
    Transport(String),

    #[error("invalid registry response: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    /// 判断错误是否值得重试
    ///
    /// 传输错误、5xx 和 429 视为瞬时错误，其他 4xx 为永久错误
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::Transport(_) => true,
            RegistryError::Status { status, .. } => *status >= 500 || *status == 429,
            RegistryError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Transport(err.to_string())
    }
}

/// 分页获取错误
///
/// 由数据源适配器或注册中心分页产生，会中止整个迭代
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("source fetch failed: {0}")]
    Source(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// 连接器与检查流程错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("server error: {0}")]
    Server(String),
}
