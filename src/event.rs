use serde::Deserialize;
use serde_json::{Map, Value};

/// `SqsEnvelope` is the record batch SQS hands a Lambda function
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SqsEnvelope {
    /// Records delivered with this invocation
    #[serde(rename = "Records")]
    pub records: Vec<SqsRecord>,
}

/// `SqsRecord` is one queued message inside an [`SqsEnvelope`]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SqsRecord {
    /// Raw message body, itself a JSON document
    pub body: String,
}

/// `ObjectCreated` is the object-created notification detail carried in a
/// stage-A routing record
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObjectCreated {
    /// Object attributes; `key` is required, the rest is forwarded as-is
    pub object: Map<String, Value>,
    /// Bucket the object landed in
    pub bucket: BucketRef,
}

/// `BucketRef` names the bucket inside an [`ObjectCreated`] detail
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BucketRef {
    /// Bucket name
    pub name: String,
}

/// `StepOutput` is one record of a finished state machine execution, whose
/// `output` field is a nested JSON document
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StepOutput {
    /// Serialized output of the execution
    pub output: String,
}

/// `ProcessedBatch` is the first element of a decoded [`StepOutput`],
/// describing what the previous stage produced
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProcessedBatch {
    /// Owning team
    pub team: String,
    /// Pipeline that produced the batch
    pub pipeline: String,
    /// Dataset the objects belong to
    pub dataset: String,
    /// Organisation identifier
    pub org: String,
    /// Data domain identifier
    pub domain: String,
    /// Deployment environment
    pub env: String,
    /// Stage-bucket keys produced by the previous stage
    #[serde(rename = "processedKeys")]
    pub processed_keys: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_routing_record() {
        let json = r#"{
    "Records": [
        {
            "messageId": "4ab8a519-3d7d-4b92-a1b5-37ed1707d089",
            "body": "{\"object\": {\"key\": \"engineering/legislators/persons.json\", \"size\": 1024}, \"bucket\": {\"name\": \"raw-bucket\"}}"
        }
    ]
}"#;
        let envelope: SqsEnvelope = serde_json::from_str(json).expect("failed to deserialize");
        assert_eq!(1, envelope.records.len());

        let detail: ObjectCreated =
            serde_json::from_str(&envelope.records[0].body).expect("failed to deserialize body");
        assert_eq!("raw-bucket", detail.bucket.name);
        assert_eq!(
            Some("engineering/legislators/persons.json"),
            detail.object.get("key").and_then(Value::as_str)
        );
    }

    #[test]
    fn test_deserialize_step_output() {
        let record = r#"{"output": "[{\"team\": \"engineering\", \"pipeline\": \"main\", \"dataset\": \"legislators\", \"org\": \"octagon\", \"domain\": \"datalake\", \"env\": \"dev\", \"processedKeys\": [\"pre-stage/engineering/legislators/persons_parsed.json\"]}]"}"#;

        let step: StepOutput = serde_json::from_str(record).expect("failed to deserialize");
        let batches: Vec<ProcessedBatch> =
            serde_json::from_str(&step.output).expect("failed to deserialize output");

        assert_eq!(1, batches.len());
        assert_eq!("engineering", batches[0].team);
        assert_eq!(
            vec!["pre-stage/engineering/legislators/persons_parsed.json".to_string()],
            batches[0].processed_keys
        );
    }
}
