use datalake_library::handlers::stage_b_fetch_metadata;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    run(service_fn(|event: LambdaEvent<Value>| {
        stage_b_fetch_metadata::handle(event)
    }))
    .await
}
