use thiserror::Error as ThisError;

/// Different errors that the application can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when an event payload is missing an expected field
    #[error("missing field {0} in payload")]
    MissingField(String),
    /// Error returned when a required environment variable is not set
    #[error("missing environment variable {0}")]
    MissingEnv(String),
    /// Error returned when an SSM parameter exists but carries no value
    #[error("no value for ssm parameter {0}")]
    MissingParameterValue(String),
    /// Error returned when a client method needs scope identifiers that
    /// were not provided at construction time
    #[error("client is not scoped to a {0}")]
    MissingScope(&'static str),
    /// Error returned when an object key has no team/dataset prefix
    #[error("object key {0} is missing team/dataset segments")]
    MalformedObjectKey(String),
    /// Error returned when a payload cannot be serialized or deserialized
    #[error("malformed json payload")]
    Json(#[from] serde_json::Error),
    /// Error returned when a decoded object key is not valid UTF-8
    #[error("object key is not valid utf-8 after decoding")]
    KeyEncoding(#[from] std::string::FromUtf8Error),
    /// Error returned when the queue depth attribute is not numeric
    #[error("invalid approximate message count")]
    MessageCount(#[from] std::num::ParseIntError),
    /// Error returned by the S3 API
    #[error("unexpected s3 error")]
    S3(#[from] aws_sdk_s3::Error),
    /// Error returned by the DynamoDB API
    #[error("unexpected dynamodb error")]
    DynamoDB(#[from] aws_sdk_dynamodb::Error),
    /// Error returned by the SQS API
    #[error("unexpected sqs error")]
    Sqs(#[from] aws_sdk_sqs::Error),
    /// Error returned by the Step Functions API
    #[error("unexpected step functions error")]
    StepFunctions(#[from] aws_sdk_sfn::Error),
    /// Error returned by the SSM API
    #[error("unexpected ssm error")]
    Ssm(#[from] aws_sdk_ssm::Error),
    /// Error returned while streaming an object body
    #[error("failed to read object stream")]
    Stream(#[from] aws_smithy_http::byte_stream::Error),
    /// Error returned when a last-modified timestamp cannot be formatted
    #[error("invalid last-modified timestamp")]
    Timestamp(#[from] aws_smithy_types::date_time::DateTimeFormatError),
    /// Error returned by local filesystem operations under /tmp
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}
