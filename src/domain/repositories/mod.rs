// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层依赖的外部协作者接口，遵循依赖倒置原则。
/// 注册中心（registry_repository）以远程服务的形式被消费，
/// 具体的HTTP实现由基础设施层提供。
pub mod registry_repository;
