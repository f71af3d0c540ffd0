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

use crate::engines::traits::{EngineError, ProbeResponse, ProbeTransport};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str = "catalink-link-checker/0.1.0";

/// HTTP探测引擎
///
/// 基于reqwest发送 HEAD 请求，只关心状态码，不读取响应体
#[derive(Clone, Debug)]
pub struct ReqwestEngine {
    client: Client,
}

impl ReqwestEngine {
    /// 创建新的HTTP探测引擎
    ///
    /// # 参数
    ///
    /// * `user_agent` - 请求使用的 User-Agent
    /// * `timeout` - 单次请求超时时间
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 引擎实例
    /// * `Err(EngineError)` - HTTP客户端构建失败
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, EngineError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| EngineError::Other(format!("Invalid user agent: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeTransport for ReqwestEngine {
    /// 发送 HEAD 请求并返回状态码
    async fn check(&self, url: &Url) -> Result<ProbeResponse, EngineError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(EngineError::UnsupportedScheme(other.to_string())),
        }

        let response = self.client.head(url.clone()).send().await?;
        let status = response.status().as_u16();
        debug!("HEAD {} -> {}", url, status);

        Ok(ProbeResponse::Http(status))
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
