// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含记录模型、注册中心接口、连接器和链接检查服务
pub mod domain;

/// 引擎模块
///
/// 实现 HTTP 与 FTP 链接探测引擎
pub mod engines;

/// 基础设施模块
///
/// 提供注册中心 HTTP 客户端和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 交互模式的路由、错误处理和中间件
pub mod presentation;

/// 队列模块
///
/// 惰性分页、有界并发迭代和按主机串行化
pub mod queue;

/// 工具模块
///
/// 提供错误类型、重试策略和日志初始化
pub mod utils;

/// 工作器模块
///
/// 注册中心全量链接检查
pub mod workers;
