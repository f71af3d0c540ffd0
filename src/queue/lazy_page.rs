// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::FetchError;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 下一页的获取结果
pub type PageResult<T> = Result<LazyPage<T>, FetchError>;

type NextPage<T> = Box<dyn FnOnce() -> BoxFuture<'static, PageResult<T>> + Send>;

/// 惰性分页
///
/// 持有当前批次的数据，以及一个尚未执行的“获取下一页”操作。
/// 下一页只有在调用 [`LazyPage::fetch_next`] 时才会真正发起请求。
pub struct LazyPage<T> {
    items: Vec<T>,
    next: Option<NextPage<T>>,
}

impl<T> fmt::Debug for LazyPage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyPage")
            .field("items", &self.items.len())
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

impl<T: Send + 'static> LazyPage<T> {
    /// 创建只有一页的分页
    pub fn single(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// 创建空分页
    pub fn empty() -> Self {
        Self::single(Vec::new())
    }

    /// 创建带有后续页的分页
    ///
    /// # 参数
    ///
    /// * `items` - 当前批次
    /// * `next` - 获取下一页的操作，仅在需要时调用一次
    pub fn new<F, Fut>(items: Vec<T>, next: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = PageResult<T>> + Send + 'static,
    {
        Self {
            items,
            next: Some(Box::new(move || Box::pin(next()) as BoxFuture<'static, _>)),
        }
    }

    /// 基于游标的远程分页
    ///
    /// `fetch` 接收游标，返回当前批次和下一游标（没有更多数据时为 `None`）。
    /// 第一页同样是惰性的：返回的分页本身为空，迭代开始时才请求第一页。
    pub fn paginate<C, F, Fut>(cursor: C, fetch: F) -> Self
    where
        C: Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(Vec<T>, Option<C>), FetchError>> + Send + 'static,
    {
        let fetch = Arc::new(fetch);
        Self::new(Vec::new(), move || Self::fetch_with(cursor, fetch))
    }

    fn fetch_with<C, F, Fut>(cursor: C, fetch: Arc<F>) -> BoxFuture<'static, PageResult<T>>
    where
        C: Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(Vec<T>, Option<C>), FetchError>> + Send + 'static,
    {
        Box::pin(async move {
            let (items, next_cursor) = (fetch.as_ref())(cursor).await?;
            Ok(match next_cursor {
                Some(next_cursor) => {
                    Self::new(items, move || Self::fetch_with(next_cursor, fetch))
                }
                None => Self::single(items),
            })
        })
    }

    /// 当前批次
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// 是否还有下一页
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// 拆分为当前批次与下一页操作
    pub(crate) fn into_parts(self) -> (Vec<T>, Option<NextPage<T>>) {
        (self.items, self.next)
    }

    /// 获取下一页
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(page))` - 下一页
    /// * `Ok(None)` - 没有更多数据
    /// * `Err(FetchError)` - 获取失败
    pub async fn fetch_next(self) -> Result<Option<LazyPage<T>>, FetchError> {
        match self.next {
            Some(next) => next().await.map(Some),
            None => Ok(None),
        }
    }

    /// 依次获取所有页并合并为一个列表
    pub async fn collect_all(self) -> Result<Vec<T>, FetchError> {
        let mut all = Vec::new();
        let mut current = Some(self);
        while let Some(page) = current.take() {
            let (items, next) = page.into_parts();
            all.extend(items);
            if let Some(next) = next {
                current = Some(next().await?);
            }
        }
        Ok(all)
    }
}
