// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：记录、导入结果与链接状态
/// - 仓库接口（repositories）：注册中心客户端抽象
/// - 服务（services）：目录导入、链接探测与质量评分
///
/// 领域层不依赖于任何具体的HTTP或存储实现。
pub mod models;
pub mod repositories;
pub mod services;
