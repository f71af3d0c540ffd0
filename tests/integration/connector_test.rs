// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{bodies_for, registry_client, start_registry};
use async_trait::async_trait;
use catalink::domain::models::record::{AspectDefinition, Record};
use catalink::domain::services::connector_service::{
    CatalogConnector, ConnectorConfig, ConnectorSource, RecordTransformer,
};
use catalink::queue::lazy_page::LazyPage;
use catalink::utils::errors::FetchError;
use serde_json::{json, Value};
use std::sync::Arc;

/// 内嵌发布者的小型目录
struct StaticCatalog {
    datasets: Vec<Value>,
}

#[async_trait]
impl ConnectorSource for StaticCatalog {
    fn id(&self) -> &str {
        "static"
    }

    fn name(&self) -> &str {
        "Static catalog"
    }

    fn has_first_class_organizations(&self) -> bool {
        false
    }

    fn datasets(&self) -> LazyPage<Value> {
        LazyPage::single(self.datasets.clone())
    }

    fn first_class_organizations(&self) -> LazyPage<Value> {
        LazyPage::empty()
    }

    fn distributions(&self, dataset: &Value) -> Option<LazyPage<Value>> {
        dataset["resources"]
            .as_array()
            .map(|resources| LazyPage::single(resources.clone()))
    }

    fn dataset_publisher_id(&self, dataset: &Value) -> Option<String> {
        dataset["organization"]["id"].as_str().map(str::to_string)
    }

    async fn dataset_publisher(&self, dataset: &Value) -> Result<Option<Value>, FetchError> {
        Ok(dataset.get("organization").cloned())
    }

    async fn dataset(&self, id: &str) -> Result<Option<Value>, FetchError> {
        Ok(self.datasets.iter().find(|d| d["id"] == id).cloned())
    }

    async fn search_datasets_by_title(
        &self,
        _title: &str,
        _max_results: usize,
    ) -> Result<LazyPage<Value>, FetchError> {
        Ok(LazyPage::empty())
    }

    async fn first_class_organization(&self, _id: &str) -> Result<Option<Value>, FetchError> {
        Ok(None)
    }

    async fn search_first_class_organizations_by_title(
        &self,
        _title: &str,
        _max_results: usize,
    ) -> Result<LazyPage<Value>, FetchError> {
        Ok(LazyPage::empty())
    }
}

struct StaticTransformer;

impl RecordTransformer for StaticTransformer {
    fn aspect_definitions(&self) -> Vec<AspectDefinition> {
        vec![AspectDefinition::new(
            "dcat-distribution-strings",
            "DCAT Distribution properties",
            None,
        )]
    }

    fn organization_id(&self, source_id: &str) -> String {
        format!("static-org-{}", source_id)
    }

    fn organization_record(&self, organization: &Value) -> Record {
        Record::new(
            self.organization_id(organization["id"].as_str().unwrap_or_default()),
            organization["title"].as_str().unwrap_or_default(),
        )
    }

    fn dataset_record(&self, dataset: &Value) -> Record {
        Record::new(
            format!("static-ds-{}", dataset["id"].as_str().unwrap_or_default()),
            dataset["title"].as_str().unwrap_or_default(),
        )
    }

    fn distribution_record(&self, distribution: &Value, dataset: &Value) -> Record {
        Record::new(
            format!(
                "static-dist-{}-{}",
                dataset["id"].as_str().unwrap_or_default(),
                distribution["id"].as_str().unwrap_or_default()
            ),
            distribution["name"].as_str().unwrap_or_default(),
        )
        .with_aspect(
            "dcat-distribution-strings",
            json!({ "downloadURL": distribution["url"] }),
        )
    }
}

#[tokio::test]
async fn test_ingests_catalog_into_registry() {
    let registry = start_registry().await;
    let catalog = StaticCatalog {
        datasets: vec![
            json!({
                "id": "rainfall",
                "title": "Rainfall",
                "organization": { "id": "bom", "title": "Bureau of Meteorology" },
                "resources": [
                    { "id": "daily", "name": "Daily", "url": "https://example.com/daily.csv" },
                    { "id": "monthly", "name": "Monthly", "url": "https://example.com/monthly.csv" }
                ]
            }),
            json!({ "id": "o'connor", "title": "O'Connor street trees" }),
        ],
    };
    let connector = CatalogConnector::new(
        Arc::new(catalog),
        Arc::new(StaticTransformer),
        Arc::new(registry_client(&registry)),
        ConnectorConfig::default(),
    );

    let result = connector.run().await.unwrap();

    assert_eq!(result.aspect_definitions_connected, 1);
    assert_eq!(result.datasets_connected, 2);
    assert_eq!(result.distributions_connected, 2);
    assert_eq!(result.organizations_connected, 1);
    assert_eq!(result.total_failures(), 0);

    let rainfall = bodies_for(&registry, "PUT", "/records/static-ds-rainfall").await;
    assert_eq!(
        rainfall[0]["aspects"]["dataset-distributions"]["distributions"],
        json!(["static-dist-rainfall-daily", "static-dist-rainfall-monthly"])
    );
    assert_eq!(
        rainfall[0]["aspects"]["dataset-publisher"],
        json!({ "publisher": "static-org-bom" })
    );

    let quoted = bodies_for(&registry, "PUT", "/records/static-ds-o%27connor").await;
    assert_eq!(quoted.len(), 1);
}
