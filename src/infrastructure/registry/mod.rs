// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 注册中心的HTTP实现
pub mod http_registry_client;
