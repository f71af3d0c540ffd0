// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心数据结构，包括：
/// - 记录（record）：注册中心中的记录、aspect 定义以及分发链接
/// - 连接结果（connection_result）：一次目录导入的成功计数与失败列表
/// - 链接状态（link_status）：链接探测结果及其持久化形式、质量评分
pub mod connection_result;
pub mod link_status;
pub mod record;
