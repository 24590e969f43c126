use crate::dynamodb::DynamoDBClient;
use std::time::{SystemTime, UNIX_EPOCH};

/// Object metadata catalog record.
///
/// Written once per ingested object; re-writes of the same object simply
/// overwrite the previous record.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogRecord {
    /// Primary key, derived as `s3://{bucket}/{key}`
    pub id: String,
    /// Milliseconds since epoch at record-construction time
    pub timestamp: i64,
    /// Bucket holding the object
    pub bucket: String,
    /// Object key within the bucket
    pub key: String,
}

impl CatalogRecord {
    /// Build a record for an object, stamping it with the current time.
    pub fn new(bucket: &str, key: &str) -> CatalogRecord {
        CatalogRecord {
            id: DynamoDBClient::build_id(bucket, key),
            timestamp: now_millis(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_record() {
        let record = CatalogRecord::new("raw", "engineering/legislators/persons.json");

        assert_eq!("s3://raw/engineering/legislators/persons.json", record.id);
        assert_eq!("raw", record.bucket);
        assert_eq!("engineering/legislators/persons.json", record.key);
        assert!(record.timestamp > 0);
    }
}
