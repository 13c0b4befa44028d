use std::collections::HashMap;
use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb as dynamodb;
use dynamodb::types::AttributeValue;
use tokio::sync::OnceCell;

use super::Storage;
use crate::config::{self, TABLE_NAME_ENV};
use crate::error::AppError;
use crate::models::PasteRecord;

/// DynamoDB-backed store. The client is created on first use and shared by
/// every clone, so a long-lived process keeps one connection pool.
#[derive(Clone)]
pub struct DynamoDbStorage {
    client: Arc<OnceCell<dynamodb::Client>>,
    table: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
}

impl DynamoDbStorage {
    pub fn new(config: &config::DynamoDbStorage) -> Self {
        DynamoDbStorage {
            client: Arc::new(OnceCell::new()),
            table: config.table.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// The configured table, else `TABLE_NAME` as it is right now.
    fn table_name(&self) -> crate::AppResult<String> {
        if let Some(table) = &self.table {
            return Ok(table.clone());
        }
        match std::env::var(TABLE_NAME_ENV) {
            Ok(table) if !table.trim().is_empty() => Ok(table),
            _ => Err(AppError::MissingTableName),
        }
    }

    async fn client(&self) -> &dynamodb::Client {
        self.client
            .get_or_init(|| async {
                let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
                    .retry_config(RetryConfig::disabled());
                if let Some(region) = &self.region {
                    config_loader =
                        config_loader.region(dynamodb::config::Region::new(region.clone()));
                }
                if let Some(endpoint) = &self.endpoint {
                    config_loader = config_loader.endpoint_url(endpoint);
                }
                let sdk_config = config_loader.load().await;

                dynamodb::Client::new(&sdk_config)
            })
            .await
    }
}

impl Storage for DynamoDbStorage {
    async fn get_record(&self, id: &str) -> crate::AppResult<Option<PasteRecord>> {
        let table = self.table_name()?;

        let output = self
            .client()
            .await
            .get_item()
            .table_name(&table)
            .key("id", AttributeValue::S(id.to_owned()))
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    AppError::TableNotFound { table: table.clone() }
                } else {
                    err.into()
                }
            })?;

        match output.item() {
            Some(item) => Ok(Some(record_from_item(id, item)?)),
            None => Ok(None),
        }
    }

    async fn put_record(&self, record: &PasteRecord) -> crate::AppResult<()> {
        let table = self.table_name()?;

        self.client()
            .await
            .put_item()
            .table_name(&table)
            .set_item(Some(item_from_record(record)))
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    AppError::TableNotFound { table: table.clone() }
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }

    fn check_config(&self) -> crate::AppResult<()> {
        self.table_name().map(|_| ())
    }
}

fn item_from_record(record: &PasteRecord) -> HashMap<String, AttributeValue> {
    [
        ("id", &record.id),
        ("paste", &record.paste),
        ("timestamp", &record.timestamp),
        ("creator_gh_user", &record.creator_gh_user),
        ("recipient_gh_username", &record.recipient_gh_username),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), AttributeValue::S(value.clone())))
    .collect()
}

fn record_from_item(
    id: &str,
    item: &HashMap<String, AttributeValue>,
) -> crate::AppResult<PasteRecord> {
    let attribute = |name: &'static str| -> crate::AppResult<String> {
        item.get(name)
            .and_then(|value| value.as_s().ok())
            .cloned()
            .ok_or_else(|| AppError::IncompleteRecord {
                id: id.to_owned(),
                attribute: name,
            })
    };

    Ok(PasteRecord {
        id: attribute("id")?,
        paste: attribute("paste")?,
        timestamp: attribute("timestamp")?,
        creator_gh_user: attribute("creator_gh_user")?,
        recipient_gh_username: attribute("recipient_gh_username")?,
    })
}
