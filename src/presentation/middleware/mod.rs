// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 中间件模块
///
/// 记录请求活动，用于交互模式的空闲退出
pub mod idle_timeout;
