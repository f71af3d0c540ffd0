// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理注册中心、连接器、链接检查和交互模式等配置
pub mod settings;
