// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 提供领域层抽象接口的具体实现：
/// - 指标（metrics）：Prometheus指标导出
/// - 注册中心（registry）：基于HTTP的注册中心客户端
pub mod metrics;
pub mod registry;
