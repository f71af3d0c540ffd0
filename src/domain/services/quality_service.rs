// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::connection_result::CreationFailure;
use crate::domain::models::link_status::{BrokenLinkAspect, LinkStatus, LinkStatusKind, QualityRating};
use crate::domain::models::record::{
    AspectDefinition, DistributionRef, Record, DATASET_QUALITY_RATING, DCAT_DISTRIBUTION_STRINGS,
    SOURCE_LINK_STATUS,
};
use crate::domain::repositories::registry_repository::{RecordQuery, RegistryClient};
use crate::domain::services::link_probe_service::LinkProber;
use crate::engines::router::is_probeable;
use crate::queue::bounded::for_each_bounded;
use crate::queue::host_serializer::host_key;
use crate::queue::lazy_page::LazyPage;
use crate::utils::errors::RegistryError;
use metrics::counter;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// 链接检查配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckConfig {
    /// 同时检查的记录数
    pub record_concurrency: usize,
    /// 单条记录内同时探测的分发数上限
    pub max_concurrency: usize,
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            record_concurrency: 4,
            max_concurrency: 10,
        }
    }
}

/// 单个分发的检查结果
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionStatus {
    pub distribution_id: String,
    pub status: LinkStatus,
}

/// 单条记录的检查报告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkCheckReport {
    pub record_id: String,
    pub distributions: Vec<DistributionStatus>,
    /// 写入的评分；没有分发时为 `None`
    pub quality: Option<QualityRating>,
    pub write_failures: Vec<CreationFailure>,
}

impl LinkCheckReport {
    fn new(record_id: &str) -> Self {
        Self {
            record_id: record_id.to_string(),
            ..Default::default()
        }
    }

    pub fn count(&self, kind: LinkStatusKind) -> usize {
        self.distributions
            .iter()
            .filter(|d| d.status.kind() == kind)
            .count()
    }

    pub fn active(&self) -> usize {
        self.count(LinkStatusKind::Active)
    }
}

/// 质量评分聚合器
///
/// 对一个数据集的所有分发做链接探测，为每个分发写入 `source-link-status`，
/// 再把可达比例作为 `dataset-quality-rating` 的一个组成部分写回数据集。
pub struct QualityAggregator {
    registry: Arc<dyn RegistryClient>,
    prober: LinkProber,
    config: LinkCheckConfig,
}

impl QualityAggregator {
    pub fn new(registry: Arc<dyn RegistryClient>, prober: LinkProber, config: LinkCheckConfig) -> Self {
        Self {
            registry,
            prober,
            config,
        }
    }

    pub fn config(&self) -> &LinkCheckConfig {
        &self.config
    }

    /// 本检查写入的 aspect 定义
    pub fn aspect_definitions() -> Vec<AspectDefinition> {
        vec![
            AspectDefinition::new(
                SOURCE_LINK_STATUS,
                "Details about the downloadURL link status of a distribution",
                Some(json!({
                    "$schema": "http://json-schema.org/schema#",
                    "title": "Broken link status of a distribution",
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "enum": ["active", "broken", "unknown"] },
                        "httpStatusCode": { "type": "integer" },
                        "errorDetails": { "type": "string" }
                    },
                    "required": ["status"]
                })),
            ),
            AspectDefinition::new(
                DATASET_QUALITY_RATING,
                "Data Quality Rating",
                Some(json!({
                    "$schema": "http://json-schema.org/schema#",
                    "title": "Quality ratings of a dataset by component",
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "properties": {
                            "score": { "type": "number", "minimum": 0, "maximum": 1 },
                            "weighting": { "type": "number", "minimum": 0, "maximum": 1 }
                        },
                        "required": ["score", "weighting"]
                    }
                })),
            ),
        ]
    }

    /// 检查一条数据集记录
    ///
    /// 没有分发时不做任何写入。写入失败记录在报告中，不影响其余写入和评分patch。
    pub async fn on_record_found(&self, record: &Record) -> LinkCheckReport {
        let mut report = LinkCheckReport::new(&record.id);
        let distributions = self.resolve_distributions(record).await;
        let total = distributions.len();
        counter!("catalink_records_checked_total").increment(1);

        if total == 0 {
            debug!("Record {} has no distributions, nothing to check", record.id);
            return report;
        }

        let cap = self.config.max_concurrency.min(distinct_hosts(&distributions)).max(1);
        debug!(
            "Checking {} distribution(s) of {} with concurrency {}",
            total, record.id, cap
        );

        let page = LazyPage::single(distributions);
        let outcome = for_each_bounded(
            page,
            cap,
            |resolved| self.check_distribution(resolved),
            |(status, written): (DistributionStatus, Result<(), RegistryError>)| {
                if let Err(e) = written {
                    warn!(
                        "Failed to write {} for {}: {}",
                        SOURCE_LINK_STATUS, status.distribution_id, e
                    );
                    report.write_failures.push(CreationFailure::new(
                        status.distribution_id.clone(),
                        Some(record.id.clone()),
                        e,
                    ));
                }
                report.distributions.push(status);
            },
        )
        .await;
        // single in-memory page, fetching never happens
        if let Err(e) = outcome {
            warn!("Distribution iteration for {} ended early: {}", record.id, e);
        }

        let rating = QualityRating {
            score: report.active() as f64 / total as f64,
            weighting: 1.0,
        };
        if let Err(e) = self
            .registry
            .patch_record_aspect(
                &record.id,
                DATASET_QUALITY_RATING,
                &rating.to_patch(SOURCE_LINK_STATUS),
            )
            .await
        {
            warn!("Failed to write quality rating for {}: {}", record.id, e);
            report
                .write_failures
                .push(CreationFailure::new(record.id.clone(), None, e));
        }
        report.quality = Some(rating);

        info!(
            "Checked {}: {}/{} distribution(s) active",
            record.id,
            report.active(),
            total
        );
        report
    }

    async fn check_distribution(
        &self,
        resolved: Resolved,
    ) -> (DistributionStatus, Result<(), RegistryError>) {
        let (distribution_id, status) = match resolved {
            Resolved::Record(distribution) => {
                let status = self
                    .prober
                    .probe_distribution(&distribution.distribution_strings())
                    .await;
                (distribution.id, status)
            }
            Resolved::Missing { id, reason } => (id, LinkStatus::Unknown { reason }),
        };
        counter!("catalink_distributions_checked_total", "status" => status.kind().as_str())
            .increment(1);

        let written = match serde_json::to_value(BrokenLinkAspect::from(&status)) {
            Ok(aspect) => self
                .registry
                .put_record_aspect(&distribution_id, SOURCE_LINK_STATUS, &aspect)
                .await
                .map(|_| ()),
            Err(e) => Err(RegistryError::InvalidResponse(e.to_string())),
        };

        (
            DistributionStatus {
                distribution_id,
                status,
            },
            written,
        )
    }

    /// 把分发引用解析为分发记录，纯ID会向注册中心读取
    async fn resolve_distributions(&self, record: &Record) -> Vec<Resolved> {
        let query = RecordQuery {
            optional_aspects: vec![DCAT_DISTRIBUTION_STRINGS.to_string()],
            ..Default::default()
        };

        let refs: Vec<(usize, DistributionRef)> =
            record.distribution_refs().into_iter().enumerate().collect();
        let mut slots: Vec<Option<Resolved>> = refs.iter().map(|_| None).collect();

        let outcome = for_each_bounded(
            LazyPage::single(refs),
            self.config.max_concurrency,
            |(index, reference)| {
                let query = &query;
                async move {
                    let resolved = match reference {
                        DistributionRef::Record(distribution) => Resolved::Record(distribution),
                        DistributionRef::Id(id) => match self.registry.get_record(&id, query).await {
                            Ok(distribution) => Resolved::Record(distribution),
                            Err(e) => {
                                warn!("Could not load distribution {}: {}", id, e);
                                Resolved::Missing {
                                    reason: format!("Could not load distribution: {}", e),
                                    id,
                                }
                            }
                        },
                    };
                    (index, resolved)
                }
            },
            |(index, resolved): (usize, Resolved)| slots[index] = Some(resolved),
        )
        .await;
        if let Err(e) = outcome {
            warn!("Distribution lookup for {} ended early: {}", record.id, e);
        }

        slots.into_iter().flatten().collect()
    }
}

/// 解析后的分发
enum Resolved {
    Record(Record),
    Missing { id: String, reason: String },
}

/// 所有分发的可探测链接涉及的主机数
fn distinct_hosts(distributions: &[Resolved]) -> usize {
    distributions
        .iter()
        .filter_map(|resolved| match resolved {
            Resolved::Record(distribution) => Some(distribution.distribution_strings()),
            Resolved::Missing { .. } => None,
        })
        .flat_map(|strings| [strings.download_url, strings.access_url])
        .flatten()
        .filter_map(|raw| Url::parse(&raw).ok())
        .filter(is_probeable)
        .filter_map(|url| host_key(&url))
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
#[path = "quality_service_test.rs"]
mod tests;
