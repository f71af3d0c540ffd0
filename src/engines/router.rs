// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::ftp_engine::FtpEngine;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::traits::{EngineError, ProbeResponse, ProbeTransport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 可探测的协议
pub const PROBEABLE_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// 判断URL的协议是否可探测
pub fn is_probeable(url: &Url) -> bool {
    PROBEABLE_SCHEMES.contains(&url.scheme())
}

/// 协议路由器
///
/// 按URL协议把探测请求分发给对应引擎
#[derive(Clone, Default)]
pub struct SchemeRouter {
    engines: HashMap<String, Arc<dyn ProbeTransport>>,
}

impl SchemeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认路由：http/https 走reqwest，ftp 走FTP引擎
    pub fn with_default_engines(user_agent: &str, timeout: Duration) -> Result<Self, EngineError> {
        let http: Arc<dyn ProbeTransport> = Arc::new(ReqwestEngine::new(user_agent, timeout)?);
        Ok(Self::new()
            .route("http", http.clone())
            .route("https", http)
            .route("ftp", Arc::new(FtpEngine::new())))
    }

    /// 为协议注册引擎，已有注册会被替换
    pub fn route(mut self, scheme: &str, engine: Arc<dyn ProbeTransport>) -> Self {
        self.engines.insert(scheme.to_ascii_lowercase(), engine);
        self
    }

    /// 查找协议对应的引擎
    pub fn engine_for(&self, scheme: &str) -> Option<&Arc<dyn ProbeTransport>> {
        self.engines.get(scheme)
    }
}

impl std::fmt::Debug for SchemeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self
            .engines
            .iter()
            .map(|(scheme, engine)| format!("{}={}", scheme, engine.name()))
            .collect();
        schemes.sort();
        f.debug_struct("SchemeRouter").field("engines", &schemes).finish()
    }
}

#[async_trait]
impl ProbeTransport for SchemeRouter {
    async fn check(&self, url: &Url) -> Result<ProbeResponse, EngineError> {
        let engine = self
            .engine_for(url.scheme())
            .ok_or_else(|| EngineError::UnsupportedScheme(url.scheme().to_string()))?;
        debug!("Routing {} to engine {}", url, engine.name());
        engine.check(url).await
    }

    fn name(&self) -> &'static str {
        "router"
    }
}
