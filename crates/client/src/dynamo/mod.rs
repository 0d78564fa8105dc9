//! DynamoDB-backed snapshot tables.
//!
//! [`DynamoTable`] implements [`TableBackend`] against the hosted key-value
//! service. Reads are strongly consistent so a write is visible to the next
//! get from the same process. Search is a full table scan with a server-side
//! filter; there is no secondary index.

mod convert;
mod error;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::client::Waiters;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue as SdkValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};
use wpsnapshots_core::store::attributes::HASH_KEY;
use wpsnapshots_core::store::{Item, ScanFilter, TableBackend, TableSpec};
use wpsnapshots_core::{AppConfig, Error, StoreFailure};

use self::convert::{FILTER_EXPRESSION, filter_bindings, item_from_sdk, item_to_sdk};
use self::error::{build_error, map_sdk_error};

/// Provider name reported for credentials taken from configuration.
const CREDENTIALS_PROVIDER: &str = "wpsnapshots-config";

/// Table backend talking to DynamoDB.
#[derive(Debug, Clone)]
pub struct DynamoTable {
    client: Client,
}

impl DynamoTable {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from configuration.
    ///
    /// Static credentials are used when both halves are configured; otherwise
    /// the SDK's default provider chain applies. `endpoint_url` points the
    /// client at a local emulator.
    pub async fn connect(config: &AppConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(key, secret, None, None, CREDENTIALS_PROVIDER));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        tracing::debug!(region = %config.region, endpoint = ?config.endpoint_url, "dynamodb client ready");
        Self::new(Client::new(&sdk_config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn key(id: &str) -> (String, SdkValue) {
        (HASH_KEY.to_string(), SdkValue::S(id.to_string()))
    }
}

#[async_trait]
impl TableBackend for DynamoTable {
    async fn get_item(&self, table: &str, id: &str) -> Result<Option<Item>, Error> {
        let (name, value) = Self::key(id);
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(name, value)
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_sdk_error(table, e))?;

        output.item.map(item_from_sdk).transpose()
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), Error> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item_to_sdk(&item)))
            .send()
            .await
            .map_err(|e| map_sdk_error(table, e))?;
        Ok(())
    }

    async fn delete_item(&self, table: &str, id: &str) -> Result<(), Error> {
        let (name, value) = Self::key(id);
        self.client
            .delete_item()
            .table_name(table)
            .key(name, value)
            .send()
            .await
            .map_err(|e| map_sdk_error(table, e))?;
        Ok(())
    }

    async fn scan(&self, table: &str, filter: Option<&ScanFilter>) -> Result<Vec<Item>, Error> {
        let mut request = self.client.scan().table_name(table);
        if let Some(filter) = filter {
            let (names, values) = filter_bindings(filter);
            request = request
                .filter_expression(FILTER_EXPRESSION)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values));
        }

        let mut pages = request.into_paginator().items().send();
        let mut items = Vec::new();
        while let Some(item) = pages.next().await {
            let item = item.map_err(|e| map_sdk_error(table, e))?;
            items.push(item_from_sdk(item)?);
        }
        tracing::debug!(table, count = items.len(), "scan complete");
        Ok(items)
    }

    async fn create_table(&self, table: &str, spec: &TableSpec) -> Result<(), Error> {
        let definition = AttributeDefinition::builder()
            .attribute_name(HASH_KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(build_error)?;
        let key = KeySchemaElement::builder()
            .attribute_name(HASH_KEY)
            .key_type(KeyType::Hash)
            .build()
            .map_err(build_error)?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(spec.read_capacity)
            .write_capacity_units(spec.write_capacity)
            .build()
            .map_err(build_error)?;

        self.client
            .create_table()
            .table_name(table)
            .attribute_definitions(definition)
            .key_schema(key)
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| map_sdk_error(table, e))?;

        tracing::info!(table, timeout = ?spec.ready_timeout, "waiting for table to become active");
        self.client
            .wait_until_table_exists()
            .table_name(table)
            .wait(spec.ready_timeout)
            .await
            .map_err(|e| {
                Error::Store(
                    StoreFailure::new(format!("table {table} did not become ready: {}", DisplayErrorContext(&e)))
                        .with_type("Timeout"),
                )
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_with_static_credentials() {
        let config = AppConfig {
            region: "eu-central-1".into(),
            access_key_id: Some("AKIDEXAMPLE".into()),
            secret_access_key: Some("secret".into()),
            endpoint_url: Some("http://localhost:8000".into()),
            ..Default::default()
        };
        let table = DynamoTable::connect(&config).await;
        let sdk = table.client().config();
        assert_eq!(sdk.region().map(|r| r.to_string()).as_deref(), Some("eu-central-1"));
    }

    #[test]
    fn test_key_uses_hash_attribute() {
        let (name, value) = DynamoTable::key("abc123");
        assert_eq!(name, "id");
        assert_eq!(value, SdkValue::S("abc123".into()));
    }
}
