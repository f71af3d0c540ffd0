// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::lazy_page::LazyPage;
use crate::utils::errors::FetchError;
use futures::StreamExt;
use std::future::Future;
use tracing::debug;

/// 有界并发遍历惰性分页
///
/// 对当前批次的每个元素调用 `op`，同时在途的操作不超过 `max_concurrency` 个；
/// 任意操作完成后立即启动下一个元素。当前批次全部完成后，才会获取下一页。
///
/// `op` 的返回值（成功或失败都属于正常结果）按完成顺序交给 `reduce`，
/// `reduce` 在调用方任务内顺序执行，因此可以直接修改累加器。
///
/// # 参数
///
/// * `page` - 第一页
/// * `max_concurrency` - 最大在途操作数，0 按 1 处理；1 表示严格按输入顺序串行
/// * `op` - 每个元素的操作
/// * `reduce` - 处理每个操作结果
///
/// # 返回值
///
/// * `Ok(())` - 所有页处理完成
/// * `Err(FetchError)` - 获取某一页失败，迭代中止
pub async fn for_each_bounded<T, R, F, Fut, A>(
    page: LazyPage<T>,
    max_concurrency: usize,
    mut op: F,
    mut reduce: A,
) -> Result<(), FetchError>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
    A: FnMut(R),
{
    let limit = max_concurrency.max(1);
    let mut current = Some(page);
    let mut page_number = 0usize;

    while let Some(page) = current.take() {
        let (items, next) = page.into_parts();
        debug!(
            page = page_number,
            items = items.len(),
            limit,
            "Processing page"
        );

        {
            let mut outcomes = futures::stream::iter(items).map(&mut op).buffer_unordered(limit);
            while let Some(outcome) = outcomes.next().await {
                reduce(outcome);
            }
        }

        if let Some(next) = next {
            current = Some(next().await?);
            page_number += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "bounded_test.rs"]
mod tests;
