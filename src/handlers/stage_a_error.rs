//! Forwards a failed execution payload to the stage DLQ, where the
//! redrive handler can pick it up later.

use super::field;
use crate::{
    client::{DataLakeClient, Scope},
    error::RuntimeError,
};
use lambda_runtime::LambdaEvent;
use serde_json::Value;

/// Lambda entry point: park the failed payload on the DLQ.
#[tracing::instrument(skip(event))]
pub async fn handle(event: LambdaEvent<Value>) -> Result<(), RuntimeError> {
    match forward(event.payload).await {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            Err(err)
        }
    }
}

async fn forward(payload: Value) -> Result<(), RuntimeError> {
    // Step Functions may hand the payload over stringified.
    let event = match payload {
        Value::String(raw) => serde_json::from_str(&raw)?,
        other => other,
    };

    let team = field(&event, "team")?;
    let pipeline = field(&event, "pipeline")?;
    let pipeline_stage = field(&event, "pipeline_stage")?;

    let config = aws_config::load_from_env().await;
    let client =
        DataLakeClient::new(&config, Scope::pipeline(team, pipeline, pipeline_stage)).await?;

    tracing::info!("execution failed, sending original payload to dlq");
    let dlq_url = client.sqs.stage_dlq_url().await?;
    client
        .sqs
        .send_message_to_fifo_queue(&event.to_string(), "failed", &dlq_url)
        .await?;

    Ok(())
}
