//! Routes freshly landed objects into the stage-A state machine.

use super::env_var;
use crate::{
    client::{DataLakeClient, Scope},
    error::RuntimeError,
    event::{ObjectCreated, SqsEnvelope},
};
use lambda_runtime::LambdaEvent;
use serde_json::{json, Value};

/// Lambda entry point: one state machine execution per queued
/// object-created notification.
#[tracing::instrument(skip(event))]
pub async fn handle(event: LambdaEvent<SqsEnvelope>) -> Result<(), RuntimeError> {
    match route(event.payload).await {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            Err(err)
        }
    }
}

async fn route(envelope: SqsEnvelope) -> Result<(), RuntimeError> {
    tracing::info!("received {} messages", envelope.records.len());
    let config = aws_config::load_from_env().await;

    for record in envelope.records {
        tracing::info!("starting state machine execution");
        let detail: ObjectCreated = serde_json::from_str(&record.body)?;

        let key = detail
            .object
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| RuntimeError::MissingField("key".into()))?;
        let (team, dataset) = scope_from_key(key)?;
        let pipeline = env_var("PIPELINE")?;
        let pipeline_stage = env_var("PIPELINE_STAGE")?;

        let mut payload = detail.object.clone();
        payload.insert("bucket".into(), json!(detail.bucket.name));
        payload.insert("team".into(), json!(team));
        payload.insert("dataset".into(), json!(dataset));
        payload.insert("pipeline".into(), json!(pipeline));
        payload.insert("pipeline_stage".into(), json!(pipeline_stage));
        payload.insert("org".into(), json!(env_var("ORG")?));
        payload.insert("domain".into(), json!(env_var("DOMAIN")?));
        payload.insert("env".into(), json!(env_var("ENV")?));

        let client =
            DataLakeClient::new(&config, Scope::pipeline(team, pipeline, pipeline_stage)).await?;
        client
            .states
            .run_state_machine(client.states.state_machine_arn()?, &Value::Object(payload))
            .await?;
    }

    Ok(())
}

/// Team and dataset are the first two segments of the object key.
fn scope_from_key(key: &str) -> Result<(String, String), RuntimeError> {
    let mut segments = key.split('/');
    match (segments.next(), segments.next()) {
        (Some(team), Some(dataset)) if !team.is_empty() && !dataset.is_empty() => {
            Ok((team.to_string(), dataset.to_string()))
        }
        _ => Err(RuntimeError::MalformedObjectKey(key.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scope_from_key() {
        let (team, dataset) =
            scope_from_key("engineering/legislators/persons.json").expect("valid key");
        assert_eq!("engineering", team);
        assert_eq!("legislators", dataset);
    }

    #[test]
    fn test_scope_from_key_without_dataset() {
        assert!(matches!(
            scope_from_key("persons.json"),
            Err(RuntimeError::MalformedObjectKey(_))
        ));
        assert!(matches!(
            scope_from_key("engineering//persons.json"),
            Err(RuntimeError::MalformedObjectKey(_))
        ));
    }
}
