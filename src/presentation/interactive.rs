// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::services::connector_service::ConnectorSource;
use crate::presentation::middleware::idle_timeout::{idle_tracking_middleware, IdleTracker};
use crate::presentation::routes::{interactive_routes, InteractiveState};
use crate::utils::errors::ConnectorError;

/// 交互模式选项
#[derive(Debug, Clone)]
pub struct InteractiveOptions {
    pub host: String,
    pub port: u16,
    /// 无请求多久后自动退出，零表示一直运行
    pub idle_timeout: Duration,
    pub harness_path: PathBuf,
    pub transformer_options: Value,
}

impl Default for InteractiveOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 6113,
            idle_timeout: Duration::ZERO,
            harness_path: PathBuf::from("dist/createTransformerForBrowser.js"),
            transformer_options: Value::Object(Default::default()),
        }
    }
}

/// 以交互模式运行连接器
///
/// 通过HTTP暴露数据源的原始数据，供浏览器中的转换器测试工具使用
///
/// # 返回值
///
/// * `Err(ConnectorError::Precondition)` - 测试工具脚本不存在，此时不会绑定端口
/// * `Err(ConnectorError::Server)` - 绑定或服务失败
pub async fn run_interactive(
    source: Arc<dyn ConnectorSource>,
    options: InteractiveOptions,
) -> Result<(), ConnectorError> {
    if !options.harness_path.is_file() {
        return Err(ConnectorError::Precondition(format!(
            "test harness {} does not exist",
            options.harness_path.display()
        )));
    }

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ConnectorError::Server(format!("failed to bind {}: {}", addr, e)))?;
    info!("Interactive server for {} listening on {}", source.name(), addr);

    serve_interactive(listener, source, options).await
}

/// 在已绑定的监听器上提供交互模式服务
pub async fn serve_interactive(
    listener: TcpListener,
    source: Arc<dyn ConnectorSource>,
    options: InteractiveOptions,
) -> Result<(), ConnectorError> {
    let tracker = IdleTracker::new();
    let state = InteractiveState {
        source,
        transformer_options: options.transformer_options,
        harness_path: options.harness_path,
    };

    let app = interactive_routes(state)
        .layer(axum::middleware::from_fn_with_state(
            tracker.clone(),
            idle_tracking_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    let idle_timeout = options.idle_timeout;
    let shutdown = async move {
        if idle_timeout.is_zero() {
            std::future::pending::<()>().await;
        }
        tracker.idle_for(idle_timeout).await;
        info!("No requests for {:?}, shutting down", idle_timeout);
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ConnectorError::Server(e.to_string()))
}
