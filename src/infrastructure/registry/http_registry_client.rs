// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::link_status::JsonPatchOperation;
use crate::domain::models::record::{AspectDefinition, Record};
use crate::domain::repositories::registry_repository::{RecordQuery, RecordsPage, RegistryClient};
use crate::utils::errors::RegistryError;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 注册中心客户端配置
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryClientConfig {
    /// API根地址，例如 `http://localhost:6101/v0`
    pub base_url: String,
    /// 瞬时错误的最大重试次数
    pub max_retries: u32,
    /// 首次重试前的等待时间
    pub min_retry_delay: Duration,
    /// 单次请求超时
    pub request_timeout: Duration,
    /// 分页读取时每页的数量
    pub page_size: usize,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6101/v0".to_string(),
            max_retries: 10,
            min_retry_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            page_size: 100,
        }
    }
}

/// 基于HTTP的注册中心客户端
///
/// 传输错误、5xx 和 429 按指数退避重试，其他 4xx 立即失败
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: Client,
    base_url: String,
    retry_policy: RetryPolicy,
    page_size: usize,
}

impl HttpRegistryClient {
    pub fn new(config: RegistryClientConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_policy: RetryPolicy::registry(config.max_retries, config.min_retry_delay),
            page_size: config.page_size,
        })
    }

    /// 拼接路径，每一段都做百分号编码（包括 `'`）
    fn endpoint(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, path.join("/"))
    }

    fn query_params(query: &RecordQuery) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = Vec::new();
        params.extend(query.aspects.iter().map(|a| ("aspect", a.clone())));
        params.extend(query.optional_aspects.iter().map(|a| ("optionalAspect", a.clone())));
        if query.dereference {
            params.push(("dereference", "true".to_string()));
        }
        params
    }

    async fn send_json<B, T>(&self, method: Method, url: String, body: &B) -> Result<T, RegistryError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let operation = method.as_str().to_string();
        self.with_retry(&operation, || {
            self.client
                .request(method.clone(), url.as_str())
                .json(body)
        })
        .await
    }

    async fn with_retry<T, F>(&self, operation: &str, build: F) -> Result<T, RegistryError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let policy = &self.retry_policy;
        let mut attempt = 0u32;

        retry_transient(&self.retry_policy, || {
            attempt += 1;
            let current = attempt;
            let can_retry = policy.should_retry(current - 1);
            let request = build();
            async move {
                counter!("catalink_registry_requests_total", "operation" => operation.to_string())
                    .increment(1);
                let result = match request.send().await {
                    Ok(response) => read_json(response).await,
                    Err(e) => Err(RegistryError::from(e)),
                };
                if let Err(e) = &result {
                    if e.is_transient() && can_retry {
                        warn!(
                            "Registry {} failed (attempt {}/{}): {}",
                            operation,
                            current,
                            policy.max_retries + 1,
                            e
                        );
                    } else {
                        counter!("catalink_registry_failures_total", "operation" => operation.to_string())
                            .increment(1);
                    }
                }
                (result, can_retry)
            }
        })
        .await
    }
}

/// 用 `backoff` 重试瞬时错误
///
/// `attempt` 返回本次结果以及是否还允许重试
async fn retry_transient<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T, RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = (Result<T, RegistryError>, bool)>,
{
    backoff::future::retry(policy.to_exponential_backoff(), || {
        let fut = attempt();
        async move {
            match fut.await {
                (Ok(value), _) => Ok(value),
                (Err(e), true) if e.is_transient() => Err(backoff::Error::transient(e)),
                (Err(e), _) => Err(backoff::Error::permanent(e)),
            }
        }
    })
    .await
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RegistryError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RegistryError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RegistryError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn put_aspect_definition(
        &self,
        definition: &AspectDefinition,
    ) -> Result<AspectDefinition, RegistryError> {
        let url = self.endpoint(&["aspects", &definition.id]);
        debug!("PUT aspect definition {}", definition.id);
        self.send_json(Method::PUT, url, definition).await
    }

    async fn put_record(&self, record: &Record) -> Result<Record, RegistryError> {
        let url = self.endpoint(&["records", &record.id]);
        debug!("PUT record {}", record.id);
        self.send_json(Method::PUT, url, record).await
    }

    async fn put_record_aspect(
        &self,
        record_id: &str,
        aspect_id: &str,
        data: &Value,
    ) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["records", record_id, "aspects", aspect_id]);
        debug!("PUT aspect {} of {}", aspect_id, record_id);
        self.send_json(Method::PUT, url, data).await
    }

    async fn patch_record_aspect(
        &self,
        record_id: &str,
        aspect_id: &str,
        operations: &[JsonPatchOperation],
    ) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["records", record_id, "aspects", aspect_id]);
        debug!("PATCH aspect {} of {}", aspect_id, record_id);
        self.send_json(Method::PATCH, url, operations).await
    }

    async fn get_record(&self, id: &str, query: &RecordQuery) -> Result<Record, RegistryError> {
        let url = self.endpoint(&["records", id]);
        let params = Self::query_params(query);
        self.with_retry("GET", || self.client.get(url.as_str()).query(&params))
            .await
    }

    async fn get_records_page(
        &self,
        query: &RecordQuery,
        page_token: Option<&str>,
    ) -> Result<RecordsPage, RegistryError> {
        let url = self.endpoint(&["records"]);
        let mut params = Self::query_params(query);
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        params.push(("limit", query.limit.unwrap_or(self.page_size).to_string()));

        debug!("GET records page (token {:?})", page_token);
        self.with_retry("GET", || self.client.get(url.as_str()).query(&params))
            .await
    }
}

#[cfg(test)]
#[path = "http_registry_client_test.rs"]
mod tests;
