use aws_sdk_dynamodb::model::AttributeValue;
use std::collections::HashMap;

/// Typed accessors over a raw DynamoDB item.
pub trait AttributeValuesExt {
    /// String attribute by name
    fn get_s(&self, key: &str) -> Option<String>;
    /// Number attribute by name
    fn get_n(&self, key: &str) -> Option<i64>;
}

impl AttributeValuesExt for HashMap<String, AttributeValue> {
    fn get_s(&self, key: &str) -> Option<String> {
        self.get(key)?.as_s().ok().cloned()
    }

    fn get_n(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_n().ok()?.parse().ok()
    }
}
