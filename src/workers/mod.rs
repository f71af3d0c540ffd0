// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 链接检查Worker：遍历注册中心并写回链接状态与质量评分
pub mod link_check_worker;

pub use link_check_worker::{LinkCheckWorker, SweepSummary};
