// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::link_status::JsonPatchOperation;
use crate::domain::models::record::{AspectDefinition, Record};
use crate::queue::lazy_page::LazyPage;
use crate::utils::errors::RegistryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// 记录查询参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// 记录必须具备的 aspect
    pub aspects: Vec<String>,
    /// 有则返回的 aspect
    pub optional_aspects: Vec<String>,
    /// 是否解引用（例如把分发ID展开为分发记录）
    pub dereference: bool,
    /// 每页数量
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn with_aspects(aspects: &[&str]) -> Self {
        Self {
            aspects: aspects.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// 一页记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// 注册中心客户端特质
///
/// 每个写操作都是幂等的完整替换（put）或 JSON Patch。
/// 调用方把每次调用视为原子的成功/失败，重试由具体实现决定。
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// 创建或替换 aspect 定义
    async fn put_aspect_definition(
        &self,
        definition: &AspectDefinition,
    ) -> Result<AspectDefinition, RegistryError>;

    /// 创建或替换记录
    async fn put_record(&self, record: &Record) -> Result<Record, RegistryError>;

    /// 创建或替换记录上的单个 aspect
    async fn put_record_aspect(
        &self,
        record_id: &str,
        aspect_id: &str,
        data: &Value,
    ) -> Result<Value, RegistryError>;

    /// 对记录上的单个 aspect 应用 JSON Patch
    async fn patch_record_aspect(
        &self,
        record_id: &str,
        aspect_id: &str,
        operations: &[JsonPatchOperation],
    ) -> Result<Value, RegistryError>;

    /// 读取单条记录
    async fn get_record(&self, id: &str, query: &RecordQuery) -> Result<Record, RegistryError>;

    /// 读取一页记录
    ///
    /// # 参数
    ///
    /// * `query` - 查询参数
    /// * `page_token` - 上一页返回的 `next_page_token`，第一页为 `None`
    async fn get_records_page(
        &self,
        query: &RecordQuery,
        page_token: Option<&str>,
    ) -> Result<RecordsPage, RegistryError>;
}

/// 把注册中心的分页查询包装为惰性分页
///
/// 一页为空或者没有 `next_page_token` 时结束
pub fn records_pages<R>(registry: Arc<R>, query: RecordQuery) -> LazyPage<Record>
where
    R: RegistryClient + ?Sized + 'static,
{
    let query = Arc::new(query);
    LazyPage::paginate(None::<String>, move |token: Option<String>| {
        let registry = registry.clone();
        let query = query.clone();
        async move {
            let page = registry.get_records_page(&query, token.as_deref()).await?;
            let next = match page.next_page_token {
                Some(token) if !page.records.is_empty() => Some(Some(token)),
                _ => None,
            };
            Ok((page.records, next))
        }
    })
}
