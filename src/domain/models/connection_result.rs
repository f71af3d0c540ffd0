// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::ConnectorError;
use std::fmt::Write;

/// 单个对象的创建失败
///
/// 创建后不可修改
#[derive(Debug, Clone, PartialEq)]
pub struct CreationFailure {
    object_id: String,
    parent_id: Option<String>,
    cause: ConnectorError,
}

impl CreationFailure {
    /// 创建失败记录
    ///
    /// # 参数
    ///
    /// * `object_id` - 失败对象的ID
    /// * `parent_id` - 父对象ID（例如分发所属的数据集）
    /// * `cause` - 失败原因
    pub fn new(
        object_id: impl Into<String>,
        parent_id: Option<String>,
        cause: impl Into<ConnectorError>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            parent_id,
            cause: cause.into(),
        }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn cause(&self) -> &ConnectorError {
        &self.cause
    }
}

/// 连接结果
///
/// 记录各阶段成功数量与失败列表，可以逐字段合并
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionResult {
    pub aspect_definitions_connected: usize,
    pub organizations_connected: usize,
    pub datasets_connected: usize,
    pub distributions_connected: usize,
    pub aspect_definition_failures: Vec<CreationFailure>,
    pub organization_failures: Vec<CreationFailure>,
    pub dataset_failures: Vec<CreationFailure>,
    pub distribution_failures: Vec<CreationFailure>,
}

impl ConnectionResult {
    /// 将另一个结果合并到自身
    pub fn merge(&mut self, other: ConnectionResult) {
        self.aspect_definitions_connected += other.aspect_definitions_connected;
        self.organizations_connected += other.organizations_connected;
        self.datasets_connected += other.datasets_connected;
        self.distributions_connected += other.distributions_connected;
        self.aspect_definition_failures
            .extend(other.aspect_definition_failures);
        self.organization_failures.extend(other.organization_failures);
        self.dataset_failures.extend(other.dataset_failures);
        self.distribution_failures.extend(other.distribution_failures);
    }

    /// 合并多个结果
    pub fn combine(results: impl IntoIterator<Item = ConnectionResult>) -> ConnectionResult {
        results
            .into_iter()
            .fold(ConnectionResult::default(), |mut total, result| {
                total.merge(result);
                total
            })
    }

    /// 失败总数
    pub fn total_failures(&self) -> usize {
        self.aspect_definition_failures.len()
            + self.organization_failures.len()
            + self.dataset_failures.len()
            + self.distribution_failures.len()
    }

    /// 生成可读的汇总报告
    pub fn summarize(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Aspect Definitions Connected: {}", self.aspect_definitions_connected);
        let _ = writeln!(out, "Organizations Connected: {}", self.organizations_connected);
        let _ = writeln!(out, "Datasets Connected: {}", self.datasets_connected);
        let _ = writeln!(out, "Distributions Connected: {}", self.distributions_connected);

        let sections = [
            ("Aspect Definition Failures", &self.aspect_definition_failures),
            ("Organization Failures", &self.organization_failures),
            ("Dataset Failures", &self.dataset_failures),
            ("Distribution Failures", &self.distribution_failures),
        ];
        for (title, failures) in sections {
            if failures.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}:", title);
            for failure in failures {
                match failure.parent_id() {
                    Some(parent) => {
                        let _ = writeln!(
                            out,
                            "  {} (in {}): {}",
                            failure.object_id(),
                            parent,
                            failure.cause()
                        );
                    }
                    None => {
                        let _ = writeln!(out, "  {}: {}", failure.object_id(), failure.cause());
                    }
                }
            }
        }
        out
    }
}
