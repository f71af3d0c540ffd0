// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use backoff::ExponentialBackoff;
use std::time::Duration;

/// 重试策略配置
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用指数退避
    pub exponential_backoff: bool,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 固定间隔、无抖动的重试策略
    ///
    /// 链接探测在两次尝试之间使用；间隔为 0 时立即重试
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff: delay,
            max_backoff: delay,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            exponential_backoff: false,
            enable_jitter: false,
        }
    }

    /// 注册中心写操作的重试策略
    ///
    /// 从 `min_delay` 开始指数增长，带抖动
    pub fn registry(max_retries: u32, min_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff: min_delay,
            max_backoff: (min_delay * 30).max(Duration::from_secs(1)),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }

    /// 计算下次重试的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.initial_backoff;
        }

        // 计算指数退避
        let backoff_secs = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.max(1) as i32 - 1);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        // 添加抖动
        let final_backoff = if self.enable_jitter && capped_backoff > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..=jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 已经重试 `attempt` 次后是否还能再重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// 转换为 `backoff` crate 的指数退避
    ///
    /// 重试次数由调用方计数，这里不设总时长上限
    pub fn to_exponential_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            current_interval: self.initial_backoff,
            randomization_factor: if self.enable_jitter {
                self.jitter_factor
            } else {
                0.0
            },
            multiplier: if self.exponential_backoff {
                self.backoff_multiplier
            } else {
                1.0
            },
            max_interval: self.max_backoff,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }
}
