use datalake_library::event::SqsEnvelope;
use datalake_library::handlers::stage_a_routing;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    run(service_fn(|event: LambdaEvent<SqsEnvelope>| {
        stage_a_routing::handle(event)
    }))
    .await
}
