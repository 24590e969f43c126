//! Aggregates the keys the previous stage produced and starts the
//! stage-B state machine.
//!
//! Two trigger shapes: a scheduled event (carrying `trigger_type`) drains
//! the stage queue itself; an SQS trigger delivers the records directly.
//! When routing fails after a response has been assembled, the partial
//! response is parked on the DLQ before the error propagates.

use super::{dedupe, env_var, field};
use crate::{
    client::{DataLakeClient, Scope},
    error::RuntimeError,
    event::{ProcessedBatch, SqsEnvelope, StepOutput},
};
use lambda_runtime::LambdaEvent;
use serde_json::{json, Value};

/// What the failure path needs to know to reach the right DLQ. Only
/// populated once a response has actually been assembled, so an early
/// failure never forwards a half-built payload.
struct RoutingContext {
    team: String,
    pipeline: String,
    stage: String,
    response: Value,
}

/// Lambda entry point: route processed keys into the stage-B state
/// machine, parking the response on the DLQ when routing fails late.
#[tracing::instrument(skip(event))]
pub async fn handle(event: LambdaEvent<Value>) -> Result<(), RuntimeError> {
    let config = aws_config::load_from_env().await;
    let mut context = None;

    match route(&config, event.payload, &mut context).await {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            if let Some(context) = context {
                if let Err(dlq_err) = forward_to_dlq(&config, &context).await {
                    // keep the original error; the DLQ forward is best effort
                    tracing::error!(error = %dlq_err, "failed to forward response to dlq");
                }
            }
            Err(err)
        }
    }
}

async fn route(
    config: &aws_types::SdkConfig,
    payload: Value,
    context: &mut Option<RoutingContext>,
) -> Result<(), RuntimeError> {
    // set by the schedule event rule
    let trigger_type = payload
        .get("trigger_type")
        .and_then(Value::as_str)
        .map(str::to_string);

    let records = match trigger_type {
        Some(_) => {
            fetch_messages(
                config,
                field(&payload, "team")?,
                field(&payload, "pipeline")?,
                field(&payload, "pipeline_stage")?,
            )
            .await?
        }
        None => {
            let envelope: SqsEnvelope = serde_json::from_value(payload)?;
            envelope.records.into_iter().map(|record| record.body).collect()
        }
    };
    tracing::info!("received {} messages", records.len());

    let mut keys_to_process: Vec<String> = Vec::new();
    let mut dispatch: Option<(DataLakeClient, Value)> = None;

    for record in &records {
        let batch = parse_step_record(record)?;
        let stage = env_var("PIPELINE_STAGE")?;

        let client = DataLakeClient::new(
            config,
            Scope::pipeline(batch.team.clone(), batch.pipeline.clone(), stage.clone()),
        )
        .await?;

        keys_to_process.extend(batch.processed_keys.iter().cloned());
        keys_to_process = dedupe(keys_to_process);
        tracing::info!("{} objects ready for processing", keys_to_process.len());

        let response = routing_response(client.s3.stage_bucket(), &keys_to_process, &batch, &stage);
        if !keys_to_process.is_empty() {
            *context = Some(RoutingContext {
                team: batch.team.clone(),
                pipeline: batch.pipeline.clone(),
                stage: stage.clone(),
                response: response.clone(),
            });
        }
        dispatch = Some((client, response));
    }

    if let Some((client, response)) = dispatch {
        tracing::info!("starting state machine execution");
        client
            .states
            .run_state_machine(client.states.state_machine_arn()?, &response)
            .await?;
    }

    Ok(())
}

/// Drain the stage queue for a scheduled trigger.
async fn fetch_messages(
    config: &aws_types::SdkConfig,
    team: &str,
    pipeline: &str,
    stage: &str,
) -> Result<Vec<String>, RuntimeError> {
    let client = DataLakeClient::new(config, Scope::pipeline(team, pipeline, stage)).await?;

    // Default values, change if required
    let min_items_to_process = 1;
    let max_items_to_process = 100;

    tracing::info!(%team, %pipeline, %stage, "querying objects waiting for processing");
    let queue_url = client.sqs.stage_queue_url().await?;
    let keys_to_process = client
        .sqs
        .receive_min_max_messages(min_items_to_process, max_items_to_process, &queue_url)
        .await?;
    tracing::info!("{} objects ready for processing", keys_to_process.len());

    Ok(dedupe(keys_to_process))
}

/// A record wraps the previous execution's output: JSON holding an
/// `output` field that is itself a serialized array, whose first element
/// describes the processed batch.
fn parse_step_record(record: &str) -> Result<ProcessedBatch, RuntimeError> {
    let step: StepOutput = serde_json::from_str(record)?;
    let batches: Vec<ProcessedBatch> = serde_json::from_str(&step.output)?;
    batches
        .into_iter()
        .next()
        .ok_or_else(|| RuntimeError::MissingField("output".into()))
}

fn routing_response(
    stage_bucket: &str,
    keys_to_process: &[String],
    batch: &ProcessedBatch,
    stage: &str,
) -> Value {
    json!({
        "statusCode": 200,
        "body": {
            "bucket": stage_bucket,
            "keysToProcess": keys_to_process,
            "team": batch.team,
            "pipeline": batch.pipeline,
            "pipeline_stage": stage,
            "dataset": batch.dataset,
            "org": batch.org,
            "domain": batch.domain,
            "env": batch.env,
        },
    })
}

async fn forward_to_dlq(
    config: &aws_types::SdkConfig,
    context: &RoutingContext,
) -> Result<(), RuntimeError> {
    let client = DataLakeClient::new(
        config,
        Scope::pipeline(
            context.team.clone(),
            context.pipeline.clone(),
            context.stage.clone(),
        ),
    )
    .await?;

    let dlq_url = client.sqs.stage_dlq_url().await?;
    client
        .sqs
        .send_message_to_fifo_queue(&context.response.to_string(), "failed", &dlq_url)
        .await
}
