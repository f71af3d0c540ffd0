// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 服务测试共用的内存实现

use crate::domain::models::link_status::JsonPatchOperation;
use crate::domain::models::record::{AspectDefinition, Record};
use crate::domain::repositories::registry_repository::{RecordQuery, RecordsPage, RegistryClient};
use crate::domain::services::connector_service::ConnectorSource;
use crate::engines::traits::{EngineError, ProbeResponse, ProbeTransport};
use crate::queue::host_serializer::host_key;
use crate::queue::lazy_page::LazyPage;
use crate::utils::errors::{FetchError, RegistryError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// 脚本化的探测应答
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    Status(u16),
    Exists,
    Refused,
    Hang,
}

/// 按URL返回预设应答的探测引擎
///
/// 脚本用完后返回 `fallback`；同时记录调用次数与每个主机的并发峰值
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Reply,
    latency: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: Mutex<HashMap<String, usize>>,
    peak: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub(crate) fn new(fallback: Reply) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashMap::new()),
            peak: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn script(self, url: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into_iter().collect());
        self
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn peak_for(&self, host: &str) -> usize {
        self.peak.lock().unwrap().get(host).copied().unwrap_or(0)
    }

    fn next_reply(&self, url: &str) -> Reply {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone())
    }
}

struct InFlightGuard<'a> {
    transport: &'a ScriptedTransport,
    host: String,
}

impl<'a> InFlightGuard<'a> {
    fn enter(transport: &'a ScriptedTransport, host: String) -> Self {
        let mut in_flight = transport.in_flight.lock().unwrap();
        let current = in_flight.entry(host.clone()).or_insert(0);
        *current += 1;
        let mut peak = transport.peak.lock().unwrap();
        let max = peak.entry(host.clone()).or_insert(0);
        *max = (*max).max(*current);
        drop(peak);
        drop(in_flight);
        Self { transport, host }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(current) = self.transport.in_flight.lock().unwrap().get_mut(&self.host) {
            *current -= 1;
        }
    }
}

#[async_trait]
impl ProbeTransport for ScriptedTransport {
    async fn check(&self, url: &Url) -> Result<ProbeResponse, EngineError> {
        self.calls.lock().unwrap().push(url.to_string());
        let host = host_key(url).unwrap_or_default();
        let _guard = InFlightGuard::enter(self, host);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_reply(url.as_str()) {
            Reply::Status(code) => Ok(ProbeResponse::Http(code)),
            Reply::Exists => Ok(ProbeResponse::Exists),
            Reply::Refused => Err(EngineError::Other("connection refused".to_string())),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// 内存注册中心
///
/// 记录所有写操作的顺序，可以指定让某些记录或 aspect 定义写入失败
#[derive(Default)]
pub(crate) struct InMemoryRegistry {
    records: Mutex<BTreeMap<String, Record>>,
    definitions: Mutex<Vec<AspectDefinition>>,
    aspect_puts: Mutex<Vec<(String, String, Value)>>,
    patches: Mutex<Vec<(String, String, Vec<JsonPatchOperation>)>>,
    log: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    page_size: Option<usize>,
    failing_page: Mutex<Option<usize>>,
    read_latency: Duration,
    reads_in_flight: Mutex<usize>,
    read_peak: Mutex<usize>,
}

impl InMemoryRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// 每次 `get_record` 先等待 `latency`，用于观察读取并发
    pub(crate) fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = latency;
        self
    }

    /// 同时在途的 `get_record` 峰值
    pub(crate) fn peak_reads(&self) -> usize {
        *self.read_peak.lock().unwrap()
    }

    pub(crate) fn insert(&self, record: Record) {
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    /// 让以该ID为目标的写操作（记录、aspect、定义或patch）返回 500
    pub(crate) fn fail_writes_to(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    /// 让第 `index` 页（从0开始）的读取失败
    pub(crate) fn fail_page(&self, index: usize) {
        *self.failing_page.lock().unwrap() = Some(index);
    }

    pub(crate) fn record(&self, id: &str) -> Option<Record> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub(crate) fn definitions(&self) -> Vec<AspectDefinition> {
        self.definitions.lock().unwrap().clone()
    }

    pub(crate) fn aspect_puts(&self) -> Vec<(String, String, Value)> {
        self.aspect_puts.lock().unwrap().clone()
    }

    pub(crate) fn patches(&self) -> Vec<(String, String, Vec<JsonPatchOperation>)> {
        self.patches.lock().unwrap().clone()
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn check_writable(&self, id: &str) -> Result<(), RegistryError> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(RegistryError::Status {
                status: 500,
                body: format!("refusing to write {}", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for InMemoryRegistry {
    async fn put_aspect_definition(
        &self,
        definition: &AspectDefinition,
    ) -> Result<AspectDefinition, RegistryError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("definition:{}", definition.id));
        self.check_writable(&definition.id)?;
        let mut definitions = self.definitions.lock().unwrap();
        definitions.retain(|d| d.id != definition.id);
        definitions.push(definition.clone());
        Ok(definition.clone())
    }

    async fn put_record(&self, record: &Record) -> Result<Record, RegistryError> {
        self.log.lock().unwrap().push(format!("record:{}", record.id));
        self.check_writable(&record.id)?;
        self.insert(record.clone());
        Ok(record.clone())
    }

    async fn put_record_aspect(
        &self,
        record_id: &str,
        aspect_id: &str,
        data: &Value,
    ) -> Result<Value, RegistryError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("aspect:{}:{}", record_id, aspect_id));
        self.check_writable(record_id)?;
        self.aspect_puts.lock().unwrap().push((
            record_id.to_string(),
            aspect_id.to_string(),
            data.clone(),
        ));
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(record_id.to_string())
            .or_insert_with(|| Record::new(record_id, ""));
        record.aspects.insert(aspect_id.to_string(), data.clone());
        Ok(data.clone())
    }

    async fn patch_record_aspect(
        &self,
        record_id: &str,
        aspect_id: &str,
        operations: &[JsonPatchOperation],
    ) -> Result<Value, RegistryError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("patch:{}:{}", record_id, aspect_id));
        self.check_writable(&format!("{}/{}", record_id, aspect_id))?;
        self.patches.lock().unwrap().push((
            record_id.to_string(),
            aspect_id.to_string(),
            operations.to_vec(),
        ));

        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(record_id.to_string())
            .or_insert_with(|| Record::new(record_id, ""));
        let aspect = record
            .aspects
            .entry(aspect_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        for op in operations {
            if let (Some(object), Some(value)) = (aspect.as_object_mut(), op.value.clone()) {
                object.insert(op.path.trim_start_matches('/').to_string(), value);
            }
        }
        Ok(aspect.clone())
    }

    async fn get_record(&self, id: &str, _query: &RecordQuery) -> Result<Record, RegistryError> {
        if !self.read_latency.is_zero() {
            {
                let mut in_flight = self.reads_in_flight.lock().unwrap();
                *in_flight += 1;
                let mut peak = self.read_peak.lock().unwrap();
                *peak = (*peak).max(*in_flight);
            }
            tokio::time::sleep(self.read_latency).await;
            *self.reads_in_flight.lock().unwrap() -= 1;
        }
        self.record(id).ok_or_else(|| RegistryError::Status {
            status: 404,
            body: format!("no record {}", id),
        })
    }

    async fn get_records_page(
        &self,
        query: &RecordQuery,
        page_token: Option<&str>,
    ) -> Result<RecordsPage, RegistryError> {
        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let page_size = query.limit.or(self.page_size).unwrap_or(usize::MAX);
        let index = if page_size == usize::MAX { 0 } else { start / page_size };
        if *self.failing_page.lock().unwrap() == Some(index) {
            return Err(RegistryError::Transport("connection reset".to_string()));
        }

        let matching: Vec<Record> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| query.aspects.iter().all(|a| r.aspects.contains_key(a)))
            .cloned()
            .collect();
        let total = matching.len();
        let records: Vec<Record> = matching.into_iter().skip(start).take(page_size).collect();
        let end = start + records.len();

        Ok(RecordsPage {
            total_count: Some(total as u64),
            next_page_token: (end < total).then(|| end.to_string()),
            records,
        })
    }
}

/// 以内存JSON为数据的目录
///
/// `failing_page` 指定的分页返回 `FetchError::Source`；发布者为 `"unreachable"` 时查询失败
#[derive(Default)]
pub(crate) struct FakeSource {
    pub(crate) datasets: Vec<Value>,
    pub(crate) organizations: Vec<Value>,
    pub(crate) first_class: bool,
    pub(crate) page_size: usize,
    pub(crate) failing_page: Option<usize>,
}

impl FakeSource {
    pub(crate) fn inline(datasets: Vec<Value>) -> Self {
        Self {
            datasets,
            page_size: 2,
            ..Default::default()
        }
    }

    pub(crate) fn first_class(datasets: Vec<Value>, organizations: Vec<Value>) -> Self {
        Self {
            datasets,
            organizations,
            first_class: true,
            page_size: 2,
            failing_page: None,
        }
    }

    fn pages(&self, items: Vec<Value>) -> LazyPage<Value> {
        let page_size = self.page_size.max(1);
        let failing_page = self.failing_page;
        let items = Arc::new(items);
        LazyPage::paginate(0usize, move |index: usize| {
            let items = items.clone();
            async move {
                if failing_page == Some(index) {
                    return Err(FetchError::Source(format!("page {} unavailable", index)));
                }
                let start = index * page_size;
                let batch: Vec<Value> = items.iter().skip(start).take(page_size).cloned().collect();
                let next = (start + page_size < items.len()).then_some(index + 1);
                Ok((batch, next))
            }
        })
    }

    fn matching(items: &[Value], field: &str, title: &str) -> Vec<Value> {
        let needle = title.to_lowercase();
        items
            .iter()
            .filter(|item| {
                item[field]
                    .as_str()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConnectorSource for FakeSource {
    fn id(&self) -> &str {
        "fake"
    }

    fn name(&self) -> &str {
        "Fake catalog"
    }

    fn has_first_class_organizations(&self) -> bool {
        self.first_class
    }

    fn datasets(&self) -> LazyPage<Value> {
        self.pages(self.datasets.clone())
    }

    fn first_class_organizations(&self) -> LazyPage<Value> {
        self.pages(self.organizations.clone())
    }

    fn distributions(&self, dataset: &Value) -> Option<LazyPage<Value>> {
        dataset["distributions"]
            .as_array()
            .map(|dists| LazyPage::single(dists.clone()))
    }

    fn dataset_publisher_id(&self, dataset: &Value) -> Option<String> {
        dataset["publisherId"].as_str().map(str::to_string)
    }

    async fn dataset_publisher(&self, dataset: &Value) -> Result<Option<Value>, FetchError> {
        match &dataset["publisher"] {
            Value::Null => Ok(None),
            Value::String(s) if s == "unreachable" => {
                Err(FetchError::Source("publisher lookup failed".to_string()))
            }
            publisher => Ok(Some(publisher.clone())),
        }
    }

    async fn dataset(&self, id: &str) -> Result<Option<Value>, FetchError> {
        Ok(self.datasets.iter().find(|d| d["id"] == id).cloned())
    }

    async fn search_datasets_by_title(
        &self,
        title: &str,
        max_results: usize,
    ) -> Result<LazyPage<Value>, FetchError> {
        let mut found = Self::matching(&self.datasets, "title", title);
        found.truncate(max_results);
        Ok(LazyPage::single(found))
    }

    async fn first_class_organization(&self, id: &str) -> Result<Option<Value>, FetchError> {
        Ok(self.organizations.iter().find(|o| o["id"] == id).cloned())
    }

    async fn search_first_class_organizations_by_title(
        &self,
        title: &str,
        _max_results: usize,
    ) -> Result<LazyPage<Value>, FetchError> {
        Ok(LazyPage::single(Self::matching(&self.organizations, "name", title)))
    }
}
