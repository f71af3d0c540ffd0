// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 在 `listen_addr` 上启动Prometheus导出器并注册指标说明。
/// 地址无效或已被占用时只记录警告，不影响主流程。
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!(
        "catalink_probe_attempts_total",
        "Total number of link probe attempts by scheme"
    );
    describe_counter!(
        "catalink_probe_results_total",
        "Total number of classified links by status"
    );
    describe_counter!(
        "catalink_distributions_checked_total",
        "Total number of distributions whose link status was written"
    );
    describe_counter!(
        "catalink_records_checked_total",
        "Total number of dataset records checked"
    );
    describe_counter!(
        "catalink_registry_requests_total",
        "Total number of registry requests by HTTP method"
    );
    describe_counter!(
        "catalink_registry_failures_total",
        "Total number of registry requests that failed permanently"
    );
    describe_counter!(
        "catalink_connector_items_total",
        "Total number of catalog objects written by kind and outcome"
    );

    info!("Metrics exporter listening on {}", addr);
}
