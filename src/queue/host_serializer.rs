// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// 按主机串行化的闸门
///
/// 为每个主机（scheme + authority）维护一个独立的先进先出闸门，
/// 保证同一主机任意时刻最多只有一个操作在执行。不同主机之间完全并行。
///
/// 闸门在首次使用时创建，运行期间不会回收。克隆后的实例共享同一组闸门。
#[derive(Clone, Debug, Default)]
pub struct HostSerializer {
    /// 每个主机的闸门；tokio 的 Mutex 按到达顺序唤醒等待者
    gates: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl HostSerializer {
    /// 创建一个新的HostSerializer实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 在主机闸门内执行操作
    ///
    /// 同一 `host` 的调用者按到达顺序排队，前一个操作结束（无论成功失败）后
    /// 才放行下一个。
    ///
    /// # 参数
    ///
    /// * `host` - 主机键，通常由 [`host_key`] 生成
    /// * `op` - 要执行的操作
    ///
    /// # 返回值
    ///
    /// 返回 `op` 的结果
    pub async fn with_host_lock<F, Fut, T>(&self, host: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let gate = self.get_or_create(host);
        let _permit = gate.lock().await;
        op().await
    }

    /// 已创建闸门的主机数量
    pub fn host_count(&self) -> usize {
        self.gates.len()
    }

    fn get_or_create(&self, host: &str) -> Arc<Mutex<()>> {
        self.gates
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// 计算URL的主机键
///
/// 形如 `https://example.com` 或 `http://example.com:8080`；没有主机的URL返回 `None`
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
