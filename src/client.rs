use crate::{
    dynamodb::DynamoDBClient, error::RuntimeError, kms::KmsKeys, s3::S3Client, sqs::SqsClient,
    ssm::SsmClient, states::StatesClient,
};

/// Identifiers that scope a client to a slice of the data lake.
///
/// Team, pipeline and stage together select the queue pair and state
/// machine; the team alone selects the team KMS keys. Unset fields leave
/// the corresponding configuration unloaded.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    /// Owning team, first segment of the object key
    pub team: Option<String>,
    /// Dataset name, second segment of the object key
    pub dataset: Option<String>,
    /// Pipeline name
    pub pipeline: Option<String>,
    /// Pipeline stage, e.g. "a" or "b"
    pub stage: Option<String>,
}

impl Scope {
    /// Scope covering a team, pipeline and stage (the shape every routing
    /// and redrive handler uses).
    pub fn pipeline(team: impl Into<String>, pipeline: impl Into<String>, stage: impl Into<String>) -> Scope {
        Scope {
            team: Some(team.into()),
            pipeline: Some(pipeline.into()),
            stage: Some(stage.into()),
            ..Scope::default()
        }
    }

    /// Scope covering a team and dataset within a stage, without a
    /// pipeline (the transform handlers' shape).
    pub fn dataset(team: impl Into<String>, dataset: impl Into<String>, stage: impl Into<String>) -> Scope {
        Scope {
            team: Some(team.into()),
            dataset: Some(dataset.into()),
            stage: Some(stage.into()),
            ..Scope::default()
        }
    }
}

/// Unified client for all data lake operations.
///
/// Each member fetches its own configuration from SSM Parameter Store at
/// construction time, sharing one SDK configuration the way the original
/// interfaces shared a session.
pub struct DataLakeClient {
    /// S3 operations and the well-known bucket names
    pub s3: S3Client,
    /// DynamoDB catalog operations
    pub dynamo: DynamoDBClient,
    /// Step Functions operations
    pub states: StatesClient,
    /// SQS queue operations
    pub sqs: SqsClient,
    /// KMS key configuration
    pub kms: KmsKeys,
}

impl DataLakeClient {
    /// Initialize every service client for the given scope.
    #[tracing::instrument(skip(config))]
    pub async fn new(config: &aws_types::SdkConfig, scope: Scope) -> Result<DataLakeClient, RuntimeError> {
        let ssm = SsmClient::new(config);

        Ok(DataLakeClient {
            s3: S3Client::new(config, &ssm).await?,
            dynamo: DynamoDBClient::new(config, &ssm).await?,
            states: StatesClient::new(config, &ssm, &scope).await?,
            sqs: SqsClient::new(config, &ssm, &scope).await?,
            kms: KmsKeys::new(&ssm, &scope).await?,
        })
    }
}
