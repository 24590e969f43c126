use crate::{catalog::CatalogRecord, dynamodb_ext::*, error::RuntimeError, ssm::SsmClient};
use aws_sdk_dynamodb::{model::AttributeValue, Client, Error};
use std::collections::HashMap;

/// DynamoDB client implementation.
///
/// Holds the metadata catalog and manifest table names, both resolved
/// from SSM at construction time.
pub struct DynamoDBClient {
    inner: Client,
    object_catalog_table: String,
    manifests_table: String,
}

impl DynamoDBClient {
    /// Initialize the DynamoDB client and resolve the table names.
    #[tracing::instrument(skip(config, ssm))]
    pub async fn new(config: &aws_types::SdkConfig, ssm: &SsmClient) -> Result<DynamoDBClient, RuntimeError> {
        tracing::info!("Initializing DynamoDB client");
        Ok(DynamoDBClient {
            inner: Client::new(config),
            object_catalog_table: ssm.get_parameter("/SDLF2/Dynamo/ObjectCatalog").await?,
            manifests_table: ssm.get_parameter("/SDLF2/Dynamo/Manifests").await?,
        })
    }

    /// Table holding the object metadata catalog
    pub fn object_catalog_table(&self) -> &str {
        &self.object_catalog_table
    }

    /// Table holding dataset manifests
    pub fn manifests_table(&self) -> &str {
        &self.manifests_table
    }

    /// Catalog primary key for an object.
    pub fn build_id(bucket: &str, key: &str) -> String {
        format!("s3://{}/{}", bucket, key)
    }

    /// Write a raw item into a table.
    #[tracing::instrument(skip(self, item))]
    pub async fn put_item(
        &self,
        table: &str,
        item: HashMap<String, AttributeValue>,
    ) -> Result<(), RuntimeError> {
        self.inner
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(Error::from)?;

        Ok(())
    }

    /// Write an object's record into the metadata catalog, overwriting any
    /// previous record for the same id.
    #[tracing::instrument(skip(self))]
    pub async fn update_object_metadata_catalog(
        &self,
        record: CatalogRecord,
    ) -> Result<(), RuntimeError> {
        self.put_item(&self.object_catalog_table, record.into())
            .await
    }
}

impl From<CatalogRecord> for HashMap<String, AttributeValue> {
    fn from(record: CatalogRecord) -> Self {
        HashMap::from([
            ("id".to_string(), AttributeValue::S(record.id)),
            (
                "timestamp".to_string(),
                AttributeValue::N(record.timestamp.to_string()),
            ),
            ("bucket".to_string(), AttributeValue::S(record.bucket)),
            ("key".to_string(), AttributeValue::S(record.key)),
        ])
    }
}

impl TryFrom<HashMap<String, AttributeValue>> for CatalogRecord {
    type Error = RuntimeError;

    /// Try to convert a DynamoDB item into a CatalogRecord.
    /// This could fail as the DynamoDB item might be missing some fields.
    fn try_from(value: HashMap<String, AttributeValue>) -> Result<Self, Self::Error> {
        Ok(CatalogRecord {
            id: value
                .get_s("id")
                .ok_or_else(|| RuntimeError::MissingField("id".into()))?,
            timestamp: value
                .get_n("timestamp")
                .ok_or_else(|| RuntimeError::MissingField("timestamp".into()))?,
            bucket: value
                .get_s("bucket")
                .ok_or_else(|| RuntimeError::MissingField("bucket".into()))?,
            key: value
                .get_s("key")
                .ok_or_else(|| RuntimeError::MissingField("key".into()))?,
        })
    }
}
