// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::connection_result::{ConnectionResult, CreationFailure};
use crate::domain::models::record::{AspectDefinition, Record, DATASET_DISTRIBUTIONS, DATASET_PUBLISHER};
use crate::domain::repositories::registry_repository::RegistryClient;
use crate::queue::bounded::for_each_bounded;
use crate::queue::lazy_page::LazyPage;
use crate::utils::errors::{ConnectorError, FetchError};
use async_trait::async_trait;
use metrics::counter;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 外部目录数据源
///
/// 以原始JSON的形式提供组织、数据集和分发，由 [`RecordTransformer`] 转换为注册中心记录
#[async_trait]
pub trait ConnectorSource: Send + Sync {
    /// 数据源ID
    fn id(&self) -> &str;

    /// 数据源名称
    fn name(&self) -> &str;

    /// 组织是否是独立的一等对象
    ///
    /// 是：组织预先作为独立记录写入，数据集只引用组织ID；
    /// 否：组织嵌在数据集中，每个数据集单独创建。
    fn has_first_class_organizations(&self) -> bool;

    /// 所有数据集
    fn datasets(&self) -> LazyPage<Value>;

    /// 所有一等组织，没有一等组织的数据源返回空分页
    fn first_class_organizations(&self) -> LazyPage<Value>;

    /// 数据集的分发；数据源不提供分发时返回 `None`
    fn distributions(&self, dataset: &Value) -> Option<LazyPage<Value>>;

    /// 数据集引用的一等组织ID
    fn dataset_publisher_id(&self, dataset: &Value) -> Option<String>;

    /// 数据集内嵌的发布者
    async fn dataset_publisher(&self, dataset: &Value) -> Result<Option<Value>, FetchError>;

    /// 按ID读取数据集
    async fn dataset(&self, id: &str) -> Result<Option<Value>, FetchError>;

    /// 按标题搜索数据集
    async fn search_datasets_by_title(
        &self,
        title: &str,
        max_results: usize,
    ) -> Result<LazyPage<Value>, FetchError>;

    /// 按ID读取一等组织
    async fn first_class_organization(&self, id: &str) -> Result<Option<Value>, FetchError>;

    /// 按标题搜索一等组织
    async fn search_first_class_organizations_by_title(
        &self,
        title: &str,
        max_results: usize,
    ) -> Result<LazyPage<Value>, FetchError>;
}

/// 把数据源对象转换为注册中心记录
pub trait RecordTransformer: Send + Sync {
    /// 记录用到的 aspect 定义
    fn aspect_definitions(&self) -> Vec<AspectDefinition>;

    /// 数据源中的组织ID对应的记录ID
    fn organization_id(&self, source_id: &str) -> String;

    fn organization_record(&self, organization: &Value) -> Record;

    fn dataset_record(&self, dataset: &Value) -> Record;

    fn distribution_record(&self, distribution: &Value, dataset: &Value) -> Record;
}

/// 连接器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// 数据集和组织写入的最大并发数
    pub max_concurrency: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self { max_concurrency: 6 }
    }
}

/// 目录连接器
///
/// 按固定顺序把数据源写入注册中心：aspect 定义、组织、数据集及其分发。
/// 单个对象写入失败只记为 [`CreationFailure`]；分页获取失败会中止整个运行。
pub struct CatalogConnector {
    source: Arc<dyn ConnectorSource>,
    transformer: Arc<dyn RecordTransformer>,
    registry: Arc<dyn RegistryClient>,
    config: ConnectorConfig,
}

impl CatalogConnector {
    pub fn new(
        source: Arc<dyn ConnectorSource>,
        transformer: Arc<dyn RecordTransformer>,
        registry: Arc<dyn RegistryClient>,
        config: ConnectorConfig,
    ) -> Self {
        Self {
            source,
            transformer,
            registry,
            config,
        }
    }

    /// 执行一次完整的连接
    ///
    /// # 返回值
    ///
    /// * `Ok(ConnectionResult)` - 三个阶段合并后的结果
    /// * `Err(ConnectorError)` - 获取某一页失败
    pub async fn run(&self) -> Result<ConnectionResult, ConnectorError> {
        info!(
            "Connecting {} ({}) with concurrency {}",
            self.source.name(),
            self.source.id(),
            self.config.max_concurrency
        );

        let definitions = self.create_aspect_definitions().await?;
        let organizations = self.create_organizations().await?;
        let datasets = self.create_datasets().await?;

        let result = ConnectionResult::combine([definitions, organizations, datasets]);
        info!(
            "Connection of {} finished with {} failure(s)",
            self.source.id(),
            result.total_failures()
        );
        Ok(result)
    }

    async fn create_aspect_definitions(&self) -> Result<ConnectionResult, ConnectorError> {
        let mut result = ConnectionResult::default();
        let page = LazyPage::single(self.transformer.aspect_definitions());

        for_each_bounded(
            page,
            self.config.max_concurrency,
            |definition| async move {
                self.registry
                    .put_aspect_definition(&definition)
                    .await
                    .map_err(|e| CreationFailure::new(definition.id.clone(), None, e))
            },
            |outcome| match outcome {
                Ok(_) => result.aspect_definitions_connected += 1,
                Err(failure) => {
                    warn!("Failed to create aspect definition {}", failure.object_id());
                    result.aspect_definition_failures.push(failure);
                }
            },
        )
        .await?;

        debug!("Created {} aspect definition(s)", result.aspect_definitions_connected);
        Ok(result)
    }

    async fn create_organizations(&self) -> Result<ConnectionResult, ConnectorError> {
        let mut result = ConnectionResult::default();
        if !self.source.has_first_class_organizations() {
            return Ok(result);
        }

        for_each_bounded(
            self.source.first_class_organizations(),
            self.config.max_concurrency,
            |organization| async move {
                let record = self.transformer.organization_record(&organization);
                self.put_record(&record, "organization", None).await
            },
            |outcome| match outcome {
                Ok(()) => result.organizations_connected += 1,
                Err(failure) => result.organization_failures.push(failure),
            },
        )
        .await?;

        info!("Created {} organization(s)", result.organizations_connected);
        Ok(result)
    }

    async fn create_datasets(&self) -> Result<ConnectionResult, ConnectorError> {
        let mut result = ConnectionResult::default();
        let mut aborted: Option<FetchError> = None;

        for_each_bounded(
            self.source.datasets(),
            self.config.max_concurrency,
            |dataset| self.create_dataset(dataset),
            |outcome| match outcome {
                Ok(dataset_result) => result.merge(dataset_result),
                Err(e) => {
                    aborted.get_or_insert(e);
                }
            },
        )
        .await?;

        if let Some(e) = aborted {
            return Err(e.into());
        }
        info!(
            "Created {} dataset(s) and {} distribution(s)",
            result.datasets_connected, result.distributions_connected
        );
        Ok(result)
    }

    /// 写入一个数据集：先逐个写入分发，再处理发布者，最后写入数据集本身
    async fn create_dataset(&self, dataset: Value) -> Result<ConnectionResult, FetchError> {
        let mut result = ConnectionResult::default();
        let mut record = self.transformer.dataset_record(&dataset);

        if let Some(page) = self.source.distributions(&dataset) {
            let dataset_id = record.id.clone();
            let mut distribution_ids = Vec::new();

            for_each_bounded(
                page,
                1,
                |distribution| {
                    let dataset = &dataset;
                    let dataset_id = &dataset_id;
                    async move {
                        let record = self.transformer.distribution_record(&distribution, dataset);
                        self.put_record(&record, "distribution", Some(dataset_id))
                            .await
                            .map(|()| record.id)
                    }
                },
                |outcome| match outcome {
                    Ok(id) => {
                        distribution_ids.push(id);
                        result.distributions_connected += 1;
                    }
                    Err(failure) => result.distribution_failures.push(failure),
                },
            )
            .await?;

            record.aspects.insert(
                DATASET_DISTRIBUTIONS.to_string(),
                json!({ "distributions": distribution_ids }),
            );
        }

        if let Some(publisher_id) = self.resolve_publisher(&dataset, &record.id, &mut result).await {
            record.aspects.insert(
                DATASET_PUBLISHER.to_string(),
                json!({ "publisher": publisher_id }),
            );
        }

        match self.put_record(&record, "dataset", None).await {
            Ok(()) => result.datasets_connected += 1,
            Err(failure) => result.dataset_failures.push(failure),
        }

        Ok(result)
    }

    /// 确定数据集的发布者记录ID
    ///
    /// 一等组织直接引用；内嵌组织需要先创建，创建失败时不设置发布者
    async fn resolve_publisher(
        &self,
        dataset: &Value,
        dataset_id: &str,
        result: &mut ConnectionResult,
    ) -> Option<String> {
        if self.source.has_first_class_organizations() {
            return self
                .source
                .dataset_publisher_id(dataset)
                .map(|id| self.transformer.organization_id(&id));
        }

        let organization = match self.source.dataset_publisher(dataset).await {
            Ok(Some(organization)) => organization,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to fetch publisher of {}: {}", dataset_id, e);
                result
                    .organization_failures
                    .push(CreationFailure::new(dataset_id, None, e));
                return None;
            }
        };

        let record = self.transformer.organization_record(&organization);
        match self.put_record(&record, "organization", None).await {
            Ok(()) => {
                result.organizations_connected += 1;
                Some(record.id)
            }
            Err(failure) => {
                result.organization_failures.push(failure);
                None
            }
        }
    }

    async fn put_record(
        &self,
        record: &Record,
        kind: &'static str,
        parent_id: Option<&str>,
    ) -> Result<(), CreationFailure> {
        match self.registry.put_record(record).await {
            Ok(_) => {
                counter!("catalink_connector_items_total", "kind" => kind, "outcome" => "created")
                    .increment(1);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create {} {}: {}", kind, record.id, e);
                counter!("catalink_connector_items_total", "kind" => kind, "outcome" => "failed")
                    .increment(1);
                Err(CreationFailure::new(
                    record.id.clone(),
                    parent_id.map(str::to_string),
                    e,
                ))
            }
        }
    }
}

#[cfg(test)]
#[path = "connector_service_test.rs"]
mod tests;
