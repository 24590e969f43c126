#![deny(missing_docs)]
//! <fullname>Data lake library</fullname>
//!
//! Shared client library and Lambda entry points for moving objects
//! through the data lake pipeline: ingestion of an S3 object, per-stage
//! transformation, queuing via SQS and orchestration via Step Functions,
//! with DynamoDB as the metadata catalog. Every client resolves its
//! configuration from SSM Parameter Store at construction time.

mod error;
pub use error::RuntimeError;

mod ssm;
pub use ssm::SsmClient;

mod s3;
pub use s3::S3Client;

mod dynamodb;
pub use dynamodb::DynamoDBClient;

mod dynamodb_ext;

mod catalog;
pub use catalog::CatalogRecord;

mod sqs;
pub use sqs::SqsClient;

mod states;
pub use states::StatesClient;

mod kms;
pub use kms::KmsKeys;

mod client;
pub use client::{DataLakeClient, Scope};

/// `event` holds the envelope types the Lambda handlers deserialize
pub mod event;

pub mod handlers;

#[cfg(test)]
mod test_util;
