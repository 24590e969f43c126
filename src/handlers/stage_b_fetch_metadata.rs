//! Attaches the Glue job configuration to the event body. Pure
//! bookkeeping; no AWS calls are made here.

use super::field;
use crate::error::RuntimeError;
use lambda_runtime::LambdaEvent;
use serde_json::{json, Map, Value};

/// Lambda entry point: return the event with `body.glue` filled in.
#[tracing::instrument(skip(event))]
pub async fn handle(event: LambdaEvent<Value>) -> Result<Value, RuntimeError> {
    match prepare(event.payload) {
        Ok(event) => Ok(event),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            Err(err)
        }
    }
}

fn prepare(mut event: Value) -> Result<Value, RuntimeError> {
    tracing::info!("fetching event data from previous step");
    let body = event
        .get("body")
        .ok_or_else(|| RuntimeError::MissingField("body".into()))?;
    let bucket = field(body, "bucket")?.to_string();
    let team = field(body, "team")?.to_string();
    let pipeline = field(body, "pipeline")?.to_string();
    let stage = field(body, "pipeline_stage")?.to_string();
    let dataset = field(body, "dataset")?.to_string();

    tracing::info!("calling user custom processing code");
    let mut glue = glue_transform_details(&bucket, &team, &dataset, &pipeline, &stage);
    glue.insert(
        "crawler_name".into(),
        json!(format!("sdlf-{}-{}-post-stage-crawler", team, dataset)),
    );

    event
        .get_mut("body")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| RuntimeError::MissingField("body".into()))?
        .insert("glue".into(), Value::Object(glue));
    tracing::info!("successfully prepared glue job configuration");

    Ok(event)
}

/// Default Glue job configuration for a dataset.
fn glue_transform_details(
    bucket: &str,
    team: &str,
    dataset: &str,
    pipeline: &str,
    stage: &str,
) -> Map<String, Value> {
    tracing::info!(%pipeline, %stage, "using default glue job configuration");

    let details = json!({
        "job_name": format!("sdlf-{}-{}-glue-job", team, dataset),
        "wait_time": 60,
        "arguments": {
            "--SOURCE_LOCATION": format!("s3://{}/pre-stage/{}/{}", bucket, team, dataset),
            "--OUTPUT_LOCATION": format!("s3://{}/post-stage/{}/{}", bucket, team, dataset),
            "--job-bookmark-option": "job-bookmark-enable",
        },
        "WorkerType": "G.1X",
        "NumberOfWorkers": 10,
    });

    match details {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}
