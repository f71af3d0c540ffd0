// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::link_status::{LinkStatus, ProbeFailure};
use crate::domain::models::record::DistributionStrings;
use crate::engines::router::is_probeable;
use crate::engines::traits::{ProbeResponse, ProbeTransport};
use crate::queue::host_serializer::{host_key, HostSerializer};
use crate::utils::retry_policy::RetryPolicy;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// 链接探测配置
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// 首次尝试失败后的重试次数
    pub retries: u32,
    /// 单次尝试的超时时间
    pub attempt_timeout: Duration,
    /// 两次尝试之间的间隔，默认立即重试
    pub retry_delay: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            attempt_timeout: Duration::from_secs(30),
            retry_delay: Duration::ZERO,
        }
    }
}

/// 链接探测器
///
/// 对单个URL做轻量的存在性检查并分类：
///
/// - 无法解析或协议不在 http/https/ftp 内：`Unknown`，不发起网络请求
/// - 2xx 或 FTP确认存在：`Active`
/// - 其他结果（非2xx、连接失败、超时）消耗一次重试，耗尽后为 `Broken`
///
/// 每次尝试都在目标主机的闸门内执行，同一主机同一时刻最多一个请求。
#[derive(Clone)]
pub struct LinkProber {
    transport: Arc<dyn ProbeTransport>,
    hosts: HostSerializer,
    config: ProbeConfig,
    retry_policy: RetryPolicy,
}

impl LinkProber {
    /// 创建新的链接探测器
    ///
    /// # 参数
    ///
    /// * `transport` - 探测引擎，通常是按协议分发的路由器
    /// * `hosts` - 主机闸门，克隆后共享
    /// * `config` - 探测配置
    pub fn new(transport: Arc<dyn ProbeTransport>, hosts: HostSerializer, config: ProbeConfig) -> Self {
        let retry_policy = RetryPolicy::fixed(config.retries, config.retry_delay);
        Self {
            transport,
            hosts,
            config,
            retry_policy,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// 探测单个URL
    ///
    /// 最多发起 `retries_remaining + 1` 次尝试
    pub async fn probe(&self, raw_url: &str, retries_remaining: u32) -> LinkStatus {
        let (url, host) = match parse_probeable(raw_url) {
            Ok(target) => target,
            Err(reason) => {
                debug!("Not probing {}: {}", raw_url, reason);
                counter!("catalink_probe_results_total", "status" => "unknown").increment(1);
                return LinkStatus::Unknown { reason };
            }
        };

        let mut remaining = retries_remaining;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            counter!("catalink_probe_attempts_total", "scheme" => url.scheme().to_string())
                .increment(1);

            match self.attempt(&url, &host).await {
                Ok(http_status_code) => {
                    debug!("{} is active after {} attempt(s)", url, attempt);
                    counter!("catalink_probe_results_total", "status" => "active").increment(1);
                    return LinkStatus::Active { http_status_code };
                }
                Err(failure) if remaining == 0 => {
                    warn!("{} is broken after {} attempt(s): {}", url, attempt, failure);
                    counter!("catalink_probe_results_total", "status" => "broken").increment(1);
                    return LinkStatus::Broken { failure };
                }
                Err(failure) => {
                    remaining -= 1;
                    debug!(
                        "Attempt {} for {} failed: {}, {} retries left",
                        attempt, url, failure, remaining
                    );
                    let delay = self.retry_policy.calculate_backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// 探测分发的候选链接
    ///
    /// 两个链接都不可探测时为 `Unknown`；只有一个可探测时以它为准；
    /// 两个都可探测时并发探测，任一成功即为 `Active`（优先使用 downloadURL 的状态码），
    /// 否则为带有 downloadURL 失败原因的 `Broken`。
    pub async fn probe_distribution(&self, strings: &DistributionStrings) -> LinkStatus {
        let retries = self.config.retries;
        let download = strings
            .download_url
            .as_deref()
            .filter(|raw| parse_probeable(raw).is_ok());
        let access = strings
            .access_url
            .as_deref()
            .filter(|raw| parse_probeable(raw).is_ok());

        match (download, access) {
            (None, None) => LinkStatus::Unknown {
                reason: unprobeable_reason(strings),
            },
            (Some(only), None) | (None, Some(only)) => self.probe(only, retries).await,
            (Some(download), Some(access)) => {
                let (download_status, access_status) =
                    futures::join!(self.probe(download, retries), self.probe(access, retries));
                if download_status.is_active() || !access_status.is_active() {
                    download_status
                } else {
                    access_status
                }
            }
        }
    }

    async fn attempt(&self, url: &Url, host: &str) -> Result<Option<u16>, ProbeFailure> {
        let timeout = self.config.attempt_timeout;
        let transport = &self.transport;

        self.hosts
            .with_host_lock(host, || async move {
                match tokio::time::timeout(timeout, transport.check(url)).await {
                    Ok(Ok(ProbeResponse::Http(code))) if (200..300).contains(&code) => Ok(Some(code)),
                    Ok(Ok(ProbeResponse::Http(code))) => Err(ProbeFailure::HttpStatus(code)),
                    Ok(Ok(ProbeResponse::Exists)) => Ok(None),
                    Ok(Err(e)) => Err(ProbeFailure::Transport(e.to_string())),
                    Err(_) => Err(ProbeFailure::Timeout(timeout.as_millis() as u64)),
                }
            })
            .await
    }
}

impl std::fmt::Debug for LinkProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkProber")
            .field("transport", &self.transport.name())
            .field("config", &self.config)
            .finish()
    }
}

fn parse_probeable(raw: &str) -> Result<(Url, String), String> {
    let url = Url::parse(raw).map_err(|e| format!("Invalid URL {:?}: {}", raw, e))?;
    if !is_probeable(&url) {
        return Err(format!("Unsupported scheme: {}", url.scheme()));
    }
    let host = host_key(&url).ok_or_else(|| format!("No host in {}", url))?;
    Ok((url, host))
}

fn unprobeable_reason(strings: &DistributionStrings) -> String {
    let reasons: Vec<String> = [
        ("downloadURL", strings.download_url.as_deref()),
        ("accessURL", strings.access_url.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, raw)| raw.map(|raw| (field, raw)))
    .filter_map(|(field, raw)| parse_probeable(raw).err().map(|e| format!("{}: {}", field, e)))
    .collect();

    if reasons.is_empty() {
        "No downloadURL or accessURL".to_string()
    } else {
        reasons.join("; ")
    }
}

#[cfg(test)]
#[path = "link_probe_service_test.rs"]
mod tests;
