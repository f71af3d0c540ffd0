// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::{sleep_until, Instant};

/// 记录最近一次请求的时间
#[derive(Clone, Debug)]
pub struct IdleTracker {
    last_activity: Arc<Mutex<Instant>>,
}

impl Default for IdleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleTracker {
    pub fn new() -> Self {
        Self {
            last_activity: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }

    fn last_activity(&self) -> Instant {
        self.last_activity
            .lock()
            .map(|last| *last)
            .unwrap_or_else(|_| Instant::now())
    }

    /// 等到连续 `timeout` 没有请求为止
    pub async fn idle_for(&self, timeout: Duration) {
        loop {
            let deadline = self.last_activity() + timeout;
            if Instant::now() >= deadline {
                return;
            }
            sleep_until(deadline).await;
        }
    }
}

pub async fn idle_tracking_middleware(
    State(tracker): State<IdleTracker>,
    request: Request,
    next: Next,
) -> Response {
    tracker.touch();
    let response = next.run(request).await;
    tracker.touch();
    response
}
