// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供惰性分页、有界并发遍历以及按主机串行化的闸门
pub mod bounded;
pub mod host_serializer;
pub mod lazy_page;
