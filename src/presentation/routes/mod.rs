// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::connector_service::ConnectorSource;
use crate::presentation::errors::{AppError, NotFound};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// 数据集搜索的最大返回数量
pub const MAX_DATASET_RESULTS: usize = 10;
/// 组织搜索的最大返回数量
pub const MAX_ORGANIZATION_RESULTS: usize = 5;

/// 交互模式的共享状态
#[derive(Clone)]
pub struct InteractiveState {
    pub source: Arc<dyn ConnectorSource>,
    /// 转换器选项，原样返回给浏览器中的测试工具
    pub transformer_options: Value,
    /// 浏览器端测试工具脚本
    pub harness_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: String,
}

/// 创建交互模式路由
///
/// 数据源有一等组织时才提供组织相关的路由
pub fn interactive_routes(state: InteractiveState) -> Router {
    let mut router = Router::new()
        .route("/v0/status", get(status))
        .route("/v0/config", get(config))
        .route("/v0/test-harness.js", get(test_harness))
        .route("/v0/datasets/{id}", get(get_dataset))
        .route("/v0/datasets/{id}/distributions", get(get_distributions))
        .route("/v0/datasets/{id}/publisher", get(get_publisher))
        .route("/v0/search/datasets", get(search_datasets));

    if state.source.has_first_class_organizations() {
        router = router
            .route("/v0/organizations/{id}", get(get_organization))
            .route("/v0/search/organizations", get(search_organizations));
    }

    router.with_state(state)
}

/// 健康检查端点
pub async fn status() -> &'static str {
    "OK"
}

async fn config(State(state): State<InteractiveState>) -> Json<Value> {
    Json(state.transformer_options)
}

async fn test_harness(State(state): State<InteractiveState>) -> Result<impl IntoResponse, AppError> {
    let script = tokio::fs::read_to_string(&state.harness_path).await?;
    Ok(([(header::CONTENT_TYPE, "application/javascript")], script))
}

async fn find_dataset(state: &InteractiveState, id: &str) -> Result<Value, AppError> {
    state
        .source
        .dataset(id)
        .await?
        .ok_or_else(|| NotFound::new("dataset", id).into())
}

async fn get_dataset(
    State(state): State<InteractiveState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(find_dataset(&state, &id).await?))
}

async fn get_distributions(
    State(state): State<InteractiveState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let dataset = find_dataset(&state, &id).await?;
    let distributions = match state.source.distributions(&dataset) {
        Some(page) => page.collect_all().await?,
        None => Vec::new(),
    };
    Ok(Json(distributions))
}

async fn get_publisher(
    State(state): State<InteractiveState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let dataset = find_dataset(&state, &id).await?;

    let publisher = if state.source.has_first_class_organizations() {
        match state.source.dataset_publisher_id(&dataset) {
            Some(publisher_id) => state.source.first_class_organization(&publisher_id).await?,
            None => None,
        }
    } else {
        state.source.dataset_publisher(&dataset).await?
    };

    publisher
        .map(Json)
        .ok_or_else(|| NotFound::new("publisher of dataset", id).into())
}

async fn search_datasets(
    State(state): State<InteractiveState>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let page = state
        .source
        .search_datasets_by_title(&query.title, MAX_DATASET_RESULTS)
        .await?;
    let mut datasets = page.collect_all().await?;
    datasets.truncate(MAX_DATASET_RESULTS);
    Ok(Json(datasets))
}

async fn get_organization(
    State(state): State<InteractiveState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .source
        .first_class_organization(&id)
        .await?
        .map(Json)
        .ok_or_else(|| NotFound::new("organization", id).into())
}

async fn search_organizations(
    State(state): State<InteractiveState>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let page = state
        .source
        .search_first_class_organizations_by_title(&query.title, MAX_ORGANIZATION_RESULTS)
        .await?;
    let mut organizations = page.collect_all().await?;
    organizations.truncate(MAX_ORGANIZATION_RESULTS);
    Ok(Json(organizations))
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
