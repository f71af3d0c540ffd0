// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::models::connection_result::CreationFailure;
use crate::domain::models::link_status::LinkStatusKind;
use crate::domain::models::record::{DATASET_DISTRIBUTIONS, DCAT_DISTRIBUTION_STRINGS};
use crate::domain::repositories::registry_repository::{records_pages, RecordQuery, RegistryClient};
use crate::domain::services::quality_service::{LinkCheckReport, QualityAggregator};
use crate::queue::bounded::for_each_bounded;
use crate::utils::errors::ConnectorError;

/// 一次全量检查的汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records_checked: usize,
    pub distributions_checked: usize,
    pub active: usize,
    pub broken: usize,
    pub unknown: usize,
    pub aspect_definition_failures: Vec<CreationFailure>,
    pub write_failures: Vec<CreationFailure>,
}

impl SweepSummary {
    fn add_report(&mut self, report: LinkCheckReport) {
        self.records_checked += 1;
        self.distributions_checked += report.distributions.len();
        self.active += report.count(LinkStatusKind::Active);
        self.broken += report.count(LinkStatusKind::Broken);
        self.unknown += report.count(LinkStatusKind::Unknown);
        self.write_failures.extend(report.write_failures);
    }

    /// 生成可读的汇总报告
    pub fn summarize(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Records Checked: {}", self.records_checked);
        let _ = writeln!(out, "Distributions Checked: {}", self.distributions_checked);
        let _ = writeln!(
            out,
            "Active: {}, Broken: {}, Unknown: {}",
            self.active, self.broken, self.unknown
        );
        if let (Some(start), Some(end)) = (self.started_at, self.finished_at) {
            let _ = writeln!(out, "Duration: {}s", (end - start).num_seconds());
        }
        for (title, failures) in [
            ("Aspect Definition Failures", &self.aspect_definition_failures),
            ("Write Failures", &self.write_failures),
        ] {
            if failures.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}:", title);
            for failure in failures {
                let _ = writeln!(out, "  {}: {}", failure.object_id(), failure.cause());
            }
        }
        out
    }
}

/// 链接检查Worker
///
/// 遍历注册中心中所有带分发的数据集，逐条执行链接检查并写回质量评分
pub struct LinkCheckWorker {
    registry: Arc<dyn RegistryClient>,
    aggregator: Arc<QualityAggregator>,
}

impl LinkCheckWorker {
    pub fn new(registry: Arc<dyn RegistryClient>, aggregator: Arc<QualityAggregator>) -> Self {
        Self {
            registry,
            aggregator,
        }
    }

    fn dataset_query() -> RecordQuery {
        RecordQuery {
            aspects: vec![DATASET_DISTRIBUTIONS.to_string()],
            optional_aspects: vec![DCAT_DISTRIBUTION_STRINGS.to_string()],
            dereference: true,
            limit: None,
        }
    }

    /// 执行一次全量检查
    ///
    /// # 返回值
    ///
    /// * `Ok(SweepSummary)` - 检查汇总，单条写入失败包含在其中
    /// * `Err(ConnectorError)` - 读取某一页记录失败，检查中止
    pub async fn run_once(&self) -> Result<SweepSummary, ConnectorError> {
        let mut summary = SweepSummary {
            started_at: Some(Utc::now()),
            ..Default::default()
        };
        info!("Starting link check sweep");

        for definition in QualityAggregator::aspect_definitions() {
            if let Err(e) = self.registry.put_aspect_definition(&definition).await {
                warn!("Failed to register aspect definition {}: {}", definition.id, e);
                summary
                    .aspect_definition_failures
                    .push(CreationFailure::new(definition.id.clone(), None, e));
            }
        }

        let aggregator = &self.aggregator;
        for_each_bounded(
            records_pages(self.registry.clone(), Self::dataset_query()),
            aggregator.config().record_concurrency,
            |record| async move { aggregator.on_record_found(&record).await },
            |report| summary.add_report(report),
        )
        .await?;

        summary.finished_at = Some(Utc::now());
        info!(
            "Link check sweep finished: {} record(s), {} distribution(s), {} broken",
            summary.records_checked, summary.distributions_checked, summary.broken
        );
        Ok(summary)
    }

    /// 检查单条记录
    pub async fn check_record(&self, id: &str) -> Result<LinkCheckReport, ConnectorError> {
        let record = self.registry.get_record(id, &Self::dataset_query()).await?;
        Ok(self.aggregator.on_record_found(&record).await)
    }
}
