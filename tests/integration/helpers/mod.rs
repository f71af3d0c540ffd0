// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{routing::get, Router};
use catalink::infrastructure::registry::http_registry_client::{
    HttpRegistryClient, RegistryClientConfig,
};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// 原样返回请求体，模拟注册中心对 PUT/PATCH 的应答
pub struct Echo;

impl Respond for Echo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_bytes(request.body.clone())
    }
}

/// 启动一个接受所有写操作的注册中心
pub async fn start_registry() -> MockServer {
    let server = MockServer::start().await;
    for verb in ["PUT", "PATCH"] {
        Mock::given(method(verb))
            .and(path_regex("^/(aspects|records)/.+$"))
            .respond_with(Echo)
            .mount(&server)
            .await;
    }
    server
}

pub fn registry_client(server: &MockServer) -> HttpRegistryClient {
    HttpRegistryClient::new(RegistryClientConfig {
        base_url: server.uri(),
        max_retries: 2,
        min_retry_delay: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
        page_size: 10,
    })
    .unwrap()
}

/// 某个路径收到的所有请求体
pub async fn bodies_for(server: &MockServer, verb: &str, url_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.to_string() == verb && r.url.path() == url_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

/// 启动被探测的文件服务器，返回根地址
///
/// `/ok` 返回 200，其他路径返回 404
pub async fn start_probe_server() -> String {
    let app = Router::new().route("/ok", get(|| async { "data" }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
