//! Runs the per-object transform and reports the produced keys.
//!
//! The transform below is the sample the framework ships: it reads a JSON
//! array, drops every object- or array-valued field from each record and
//! re-uploads the result to the stage bucket. Teams replace it with their
//! own logic; the handler contract is only that `processedKeys` lists the
//! stage-bucket keys the transform produced.

use super::field;
use crate::{
    client::{DataLakeClient, Scope},
    error::RuntimeError,
};
use lambda_runtime::LambdaEvent;
use serde_json::{json, Value};
use std::path::Path;

/// Lambda entry point: transform one object, return the event enriched
/// with `processedKeys`.
#[tracing::instrument(skip(event))]
pub async fn handle(event: LambdaEvent<Value>) -> Result<Value, RuntimeError> {
    match process(event.payload).await {
        Ok(event) => Ok(event),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            Err(err)
        }
    }
}

async fn process(mut event: Value) -> Result<Value, RuntimeError> {
    tracing::info!("fetching event data from previous step");
    let bucket = field(&event, "bucket")?.to_string();
    let key = field(&event, "key")?.to_string();
    let team = field(&event, "team")?.to_string();
    let dataset = field(&event, "dataset")?.to_string();

    tracing::info!("calling user custom processing code");
    let processed_keys = transform_object(&bucket, &key, &team, &dataset).await?;

    event
        .as_object_mut()
        .ok_or_else(|| RuntimeError::MissingField("event".into()))?
        .insert("processedKeys".into(), json!(processed_keys));
    tracing::info!("successfully processed object");

    Ok(event)
}

/// Download, transform and re-upload one object, returning the
/// stage-bucket keys it produced.
async fn transform_object(
    bucket: &str,
    key: &str,
    team: &str,
    dataset: &str,
) -> Result<Vec<String>, RuntimeError> {
    let config = aws_config::load_from_env().await;
    let client = DataLakeClient::new(&config, Scope::dataset(team, dataset, "a")).await?;

    let local_path = client.s3.download_object(bucket, key).await?;

    let raw = tokio::fs::read_to_string(&local_path).await?;
    let records: Vec<Value> = serde_json::from_str(&raw)?;
    let parsed = strip_nested_fields(&records);

    let file_name = parsed_file_name(&local_path);
    let output_path = local_path.with_file_name(&file_name);
    tokio::fs::write(&output_path, serde_json::to_vec_pretty(&Value::Array(parsed))?).await?;

    let s3_path = format!("pre-stage/{}/{}/{}", team, dataset, file_name);
    client
        .s3
        .upload_object(
            &output_path,
            client.s3.stage_bucket(),
            &s3_path,
            Some(client.kms.team_data_kms_key()?),
        )
        .await?;

    Ok(vec![s3_path])
}

/// Keep only the scalar fields of each record.
fn strip_nested_fields(records: &[Value]) -> Vec<Value> {
    records
        .iter()
        .map(|record| match record {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, value)| !value.is_object() && !value.is_array())
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            other => other.clone(),
        })
        .collect()
}

/// `persons.json` becomes `persons_parsed.json`.
fn parsed_file_name(local_path: &Path) -> String {
    let stem = local_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    format!("{}_parsed.json", stem)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_nested_fields() {
        let records = vec![
            json!({"name": "ada", "terms": [{"start": "1837"}], "links": {"wiki": "..."}}),
            json!({"name": "grace", "rank": 1}),
        ];

        let parsed = strip_nested_fields(&records);

        assert_eq!(
            vec![json!({"name": "ada"}), json!({"name": "grace", "rank": 1})],
            parsed
        );
    }

    #[test]
    fn test_strip_nested_fields_keeps_non_objects() {
        let records = vec![json!("plain"), json!(3)];
        assert_eq!(records.clone(), strip_nested_fields(&records));
    }

    #[test]
    fn test_parsed_file_name() {
        assert_eq!(
            "persons_parsed.json",
            parsed_file_name(Path::new("/tmp/raw-bucket/persons.json"))
        );
        assert_eq!(
            "persons_parsed.json",
            parsed_file_name(Path::new("/tmp/raw-bucket/persons"))
        );
    }
}
