// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 连接服务（connector_service）：把外部目录按阶段写入注册中心
/// - 链接探测服务（link_probe_service）：带重试与主机串行化的链接探测
/// - 质量服务（quality_service）：汇总分发的链接状态并写回质量评分
pub mod connector_service;
pub mod link_probe_service;
pub mod quality_service;

#[cfg(test)]
pub(crate) mod fakes;
