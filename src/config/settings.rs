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

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::services::connector_service::ConnectorConfig;
use crate::domain::services::link_probe_service::ProbeConfig;
use crate::domain::services::quality_service::LinkCheckConfig;
use crate::infrastructure::registry::http_registry_client::RegistryClientConfig;
use crate::presentation::interactive::InteractiveOptions;

/// 应用程序配置设置
///
/// 包含注册中心、连接器、链接检查、交互模式和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 注册中心配置
    pub registry: RegistrySettings,
    /// 连接器配置
    pub connector: ConnectorSettings,
    /// 链接检查配置
    pub link_check: LinkCheckSettings,
    /// 交互模式配置
    pub interactive: InteractiveSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 注册中心配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    /// 注册中心API根地址
    pub url: String,
    /// 瞬时错误的最大重试次数
    pub max_retries: u32,
    /// 首次重试等待时间（毫秒）
    pub min_retry_delay_ms: u64,
    /// 单次请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 每页记录数
    pub page_size: usize,
}

/// 连接器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorSettings {
    pub max_concurrency: usize,
}

/// 链接检查配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LinkCheckSettings {
    /// 同时检查的记录数
    pub record_concurrency: usize,
    /// 单条记录内同时探测的分发数上限
    pub max_concurrency: usize,
    /// 每个URL的探测次数
    pub retries: u32,
    /// 单次探测超时时间（秒）
    pub attempt_timeout_secs: u64,
    /// 两次探测之间的等待时间（毫秒）
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

/// 交互模式配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct InteractiveSettings {
    pub host: String,
    pub port: u16,
    /// 空闲退出时间（秒），0 表示不退出
    pub idle_timeout_secs: u64,
    /// 浏览器端测试工具脚本路径
    pub harness_path: String,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、配置文件和 `CATALINK__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Registry
            .set_default("registry.url", "http://localhost:6101/v0")?
            .set_default("registry.max_retries", 10)?
            .set_default("registry.min_retry_delay_ms", 1000)?
            .set_default("registry.request_timeout_secs", 30)?
            .set_default("registry.page_size", 100)?
            // Connector
            .set_default("connector.max_concurrency", 6)?
            // Link checking
            .set_default("link_check.record_concurrency", 4)?
            .set_default("link_check.max_concurrency", 10)?
            .set_default("link_check.retries", 3)?
            .set_default("link_check.attempt_timeout_secs", 30)?
            .set_default("link_check.retry_delay_ms", 0)?
            .set_default(
                "link_check.user_agent",
                concat!("catalink-link-checker/", env!("CARGO_PKG_VERSION")),
            )?
            // Interactive mode
            .set_default("interactive.host", "0.0.0.0")?
            .set_default("interactive.port", 6113)?
            .set_default("interactive.idle_timeout_secs", 0)?
            .set_default("interactive.harness_path", "dist/createTransformerForBrowser.js")?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CATALINK").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn registry_client_config(&self) -> RegistryClientConfig {
        RegistryClientConfig {
            base_url: self.registry.url.clone(),
            max_retries: self.registry.max_retries,
            min_retry_delay: Duration::from_millis(self.registry.min_retry_delay_ms),
            request_timeout: Duration::from_secs(self.registry.request_timeout_secs),
            page_size: self.registry.page_size.max(1),
        }
    }

    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            max_concurrency: self.connector.max_concurrency.max(1),
        }
    }

    /// 单个URL的探测配置；`retries` 至少为 1
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            retries: self.link_check.retries.max(1),
            attempt_timeout: self.attempt_timeout(),
            retry_delay: Duration::from_millis(self.link_check.retry_delay_ms),
        }
    }

    pub fn link_check_config(&self) -> LinkCheckConfig {
        LinkCheckConfig {
            record_concurrency: self.link_check.record_concurrency.max(1),
            max_concurrency: self.link_check.max_concurrency.max(1),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.link_check.attempt_timeout_secs)
    }

    /// 交互模式选项，转换器选项由调用方提供
    pub fn interactive_options(&self, transformer_options: Value) -> InteractiveOptions {
        InteractiveOptions {
            host: self.interactive.host.clone(),
            port: self.interactive.port,
            idle_timeout: Duration::from_secs(self.interactive.idle_timeout_secs),
            harness_path: PathBuf::from(&self.interactive.harness_path),
            transformer_options,
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
