// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{bodies_for, registry_client, start_probe_server, start_registry};
use catalink::domain::services::link_probe_service::{LinkProber, ProbeConfig};
use catalink::domain::services::quality_service::{LinkCheckConfig, QualityAggregator};
use catalink::engines::router::SchemeRouter;
use catalink::queue::host_serializer::HostSerializer;
use catalink::workers::LinkCheckWorker;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn distribution(id: &str, download_url: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "aspects": { "dcat-distribution-strings": { "downloadURL": download_url } }
    })
}

fn worker(registry: &MockServer) -> LinkCheckWorker {
    let router = SchemeRouter::with_default_engines("catalink-test", Duration::from_secs(5)).unwrap();
    let prober = LinkProber::new(
        Arc::new(router),
        HostSerializer::new(),
        ProbeConfig {
            retries: 2,
            attempt_timeout: Duration::from_secs(5),
            retry_delay: Duration::ZERO,
        },
    );
    let client = Arc::new(registry_client(registry));
    let aggregator = QualityAggregator::new(client.clone(), prober, LinkCheckConfig::default());
    LinkCheckWorker::new(client, Arc::new(aggregator))
}

#[tokio::test]
async fn test_sweep_writes_statuses_and_quality() {
    let files = start_probe_server().await;
    let registry = start_registry().await;

    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("aspect", "dataset-distributions"))
        .and(query_param("dereference", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 2,
            "records": [
                {
                    "id": "ds-1",
                    "name": "Air quality",
                    "aspects": { "dataset-distributions": { "distributions": [
                        distribution("ds-1-csv", &format!("{}/ok", files)),
                        distribution("ds-1-xls", &format!("{}/gone.xls", files)),
                        distribution("ds-1-mail", "mailto:data@example.com")
                    ]}}
                },
                {
                    "id": "ds-2",
                    "name": "Empty",
                    "aspects": { "dataset-distributions": { "distributions": [] } }
                }
            ]
        })))
        .expect(1)
        .mount(&registry)
        .await;

    let summary = worker(&registry).run_once().await.unwrap();

    assert_eq!(summary.records_checked, 2);
    assert_eq!(summary.distributions_checked, 3);
    assert_eq!((summary.active, summary.broken, summary.unknown), (1, 1, 1));
    assert!(summary.write_failures.is_empty());
    assert!(summary.aspect_definition_failures.is_empty());

    let csv = bodies_for(&registry, "PUT", "/records/ds-1-csv/aspects/source-link-status").await;
    assert_eq!(csv, vec![json!({ "status": "active", "httpStatusCode": 200 })]);

    let xls = bodies_for(&registry, "PUT", "/records/ds-1-xls/aspects/source-link-status").await;
    assert_eq!(xls[0]["status"], "broken");
    assert_eq!(xls[0]["httpStatusCode"], 404);

    let patches = bodies_for(&registry, "PATCH", "/records/ds-1/aspects/dataset-quality-rating").await;
    assert_eq!(patches.len(), 1);
    let score = patches[0][0]["value"]["score"].as_f64().unwrap();
    assert!((score - 1.0 / 3.0).abs() < 1e-9);

    let empty = bodies_for(&registry, "PATCH", "/records/ds-2/aspects/dataset-quality-rating").await;
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_check_record_over_http() {
    let files = start_probe_server().await;
    let registry = start_registry().await;

    Mock::given(method("GET"))
        .and(path("/records/ds-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ds-9",
            "name": "Single",
            "aspects": { "dataset-distributions": { "distributions": [
                distribution("ds-9-csv", &format!("{}/ok", files))
            ]}}
        })))
        .mount(&registry)
        .await;

    let report = worker(&registry).check_record("ds-9").await.unwrap();

    assert_eq!(report.active(), 1);
    assert_eq!(report.quality.map(|q| q.score), Some(1.0));
}
