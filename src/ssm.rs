use crate::error::RuntimeError;
use aws_sdk_ssm::{types::SdkError, Client, Error};

/// Thin wrapper around the SSM Parameter Store API.
///
/// Every other client fetches its configuration through this one at
/// construction time.
pub struct SsmClient {
    inner: Client,
}

impl SsmClient {
    /// Initialize the SSM client.
    pub fn new(config: &aws_types::SdkConfig) -> SsmClient {
        SsmClient {
            inner: Client::new(config),
        }
    }

    /// Fetch a parameter value by name.
    ///
    /// Throttling is logged before the error propagates; retries are the
    /// caller's (or the invoking service's) responsibility.
    #[tracing::instrument(skip(self))]
    pub async fn get_parameter(&self, name: &str) -> Result<String, RuntimeError> {
        let response = match self.inner.get_parameter().name(name).send().await {
            Ok(response) => response,
            Err(sdk_err) => {
                if let SdkError::ServiceError { err, .. } = &sdk_err {
                    if err.code() == Some("ThrottlingException") {
                        tracing::error!("ssm rate limit reached");
                    } else {
                        tracing::error!("error getting ssm parameter {}: {}", name, err);
                    }
                }
                return Err(Error::from(sdk_err).into());
            }
        };

        response
            .parameter
            .and_then(|parameter| parameter.value)
            .ok_or_else(|| RuntimeError::MissingParameterValue(name.into()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::*;
    use aws_sdk_ssm::{Client, Config};
    use aws_smithy_client::{erase::DynConnector, test_connection::TestConnection};
    use aws_smithy_http::body::SdkBody;

    #[tokio::test]
    async fn test_get_parameter() -> Result<(), RuntimeError> {
        // GIVEN a parameter with a value
        let conn = TestConnection::new(vec![(
            get_request_builder("ssm")
                .header("content-type", "application/x-amz-json-1.1")
                .header("x-amz-target", "AmazonSSM.GetParameter")
                .body(SdkBody::from(r#"{"Name":"/SDLF2/Dynamo/ObjectCatalog"}"#))
                .unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::from(
                    r#"{"Parameter":{"Name":"/SDLF2/Dynamo/ObjectCatalog","Type":"String","Value":"octagon-ObjectMetadata"}}"#,
                ))
                .unwrap(),
        )]);
        let config = Config::new(&get_mock_config().await);
        let inner = Client::from_conf_conn(config, DynConnector::new(conn.clone()));
        let ssm = SsmClient { inner };

        // WHEN fetching the parameter
        let value = ssm.get_parameter("/SDLF2/Dynamo/ObjectCatalog").await?;

        // THEN the value comes back verbatim
        assert_eq!("octagon-ObjectMetadata", value);
        conn.assert_requests_match(&vec![]);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_parameter_throttled() {
        // GIVEN SSM replying with a throttling error
        let conn = TestConnection::new(vec![(
            get_request_builder("ssm")
                .header("content-type", "application/x-amz-json-1.1")
                .header("x-amz-target", "AmazonSSM.GetParameter")
                .body(SdkBody::from(r#"{"Name":"/SDLF2/S3/StageBucket"}"#))
                .unwrap(),
            http::Response::builder()
                .status(400)
                .body(SdkBody::from(
                    r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#,
                ))
                .unwrap(),
        )]);
        let config = Config::new(&get_mock_config().await);
        let inner = Client::from_conf_conn(config, DynConnector::new(conn));
        let ssm = SsmClient { inner };

        // WHEN fetching a parameter THEN the error still propagates
        let result = ssm.get_parameter("/SDLF2/S3/StageBucket").await;
        assert!(matches!(result, Err(RuntimeError::Ssm(_))));
    }
}
