//! Moves one batch of messages from the stage DLQ back onto the stage
//! queue. Triggered manually or on a schedule; the event payload is
//! ignored.

use super::env_var;
use crate::{
    client::{DataLakeClient, Scope},
    error::RuntimeError,
};
use lambda_runtime::LambdaEvent;
use serde_json::Value;

/// Lambda entry point: redrive DLQ messages for the configured stage.
#[tracing::instrument(skip(_event))]
pub async fn handle(_event: LambdaEvent<Value>) -> Result<(), RuntimeError> {
    match redrive().await {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            Err(err)
        }
    }
}

async fn redrive() -> Result<(), RuntimeError> {
    let config = aws_config::load_from_env().await;
    let client = DataLakeClient::new(
        &config,
        Scope::pipeline(env_var("TEAM")?, env_var("PIPELINE")?, env_var("STAGE")?),
    )
    .await?;

    let dlq_url = client.sqs.stage_dlq_url().await?;
    let messages = client.sqs.receive_messages(1, &dlq_url).await?;
    if messages.is_empty() {
        tracing::info!("no messages found in dlq");
        return Ok(());
    }

    tracing::info!("received {} messages", messages.len());
    let queue_url = client.sqs.stage_queue_url().await?;
    for message in messages {
        let body = message
            .body
            .ok_or_else(|| RuntimeError::MissingField("Body".into()))?;
        client
            .sqs
            .send_message_to_fifo_queue(&body, "redrive", &queue_url)
            .await?;
        tracing::info!("redrive message succeeded");
    }

    Ok(())
}
