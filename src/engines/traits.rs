// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// 探测引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 连接或读写失败
    #[error("Connection failed: {0}")]
    Io(#[from] std::io::Error),
    /// FTP服务器拒绝或目标不存在
    #[error("FTP error: {code} {message}")]
    Ftp { code: u16, message: String },
    /// 不支持的协议
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 探测响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResponse {
    /// 收到HTTP响应，携带状态码
    Http(u16),
    /// 非HTTP协议确认目标存在
    Exists,
}

/// 探测引擎特质
///
/// 对单个URL做一次轻量的存在性检查，不做重试也不做分类
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// 执行一次探测
    async fn check(&self, url: &Url) -> Result<ProbeResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
