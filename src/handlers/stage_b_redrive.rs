//! Replays DLQ messages through the stage-B state machine. Unlike the
//! stage-A redrive, the message body is the state machine input itself.

use super::env_var;
use crate::{
    client::{DataLakeClient, Scope},
    error::RuntimeError,
};
use lambda_runtime::LambdaEvent;
use serde_json::Value;

/// Lambda entry point: redrive DLQ messages into the state machine.
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
    for message in messages {
        tracing::info!("starting state machine execution");
        let body = message
            .body
            .ok_or_else(|| RuntimeError::MissingField("Body".into()))?;
        let payload: Value = serde_json::from_str(&body)?;
        client
            .states
            .run_state_machine(client.states.state_machine_arn()?, &payload)
            .await?;
        tracing::info!("redrive message succeeded");
    }

    Ok(())
}
