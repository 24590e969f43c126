use crate::{client::Scope, error::RuntimeError, ssm::SsmClient};
use aws_sdk_sfn::{Client, Error};
use serde_json::Value;

/// Step Functions client implementation.
///
/// When the scope names a team, pipeline and stage, the stage state
/// machine ARN is resolved from SSM at construction time.
pub struct StatesClient {
    inner: Client,
    state_machine_arn: Option<String>,
}

impl StatesClient {
    /// Initialize the Step Functions client, resolving the stage state
    /// machine ARN when the scope allows it.
    #[tracing::instrument(skip(config, ssm))]
    pub async fn new(
        config: &aws_types::SdkConfig,
        ssm: &SsmClient,
        scope: &Scope,
    ) -> Result<StatesClient, RuntimeError> {
        let state_machine_arn = match (&scope.team, &scope.pipeline, &scope.stage) {
            (Some(team), Some(pipeline), Some(stage)) => Some(
                ssm.get_parameter(&format!("/SDLF/SM/{}/{}{}SM", team, pipeline, stage))
                    .await?,
            ),
            _ => None,
        };

        Ok(StatesClient {
            inner: Client::new(config),
            state_machine_arn,
        })
    }

    /// ARN of the stage state machine.
    pub fn state_machine_arn(&self) -> Result<&str, RuntimeError> {
        self.state_machine_arn
            .as_deref()
            .ok_or(RuntimeError::MissingScope("state machine"))
    }

    /// Start an execution of a state machine with a JSON payload, returning
    /// the execution ARN.
    #[tracing::instrument(skip(self, message))]
    pub async fn run_state_machine(
        &self,
        machine_arn: &str,
        message: &Value,
    ) -> Result<String, RuntimeError> {
        let execution = self
            .inner
            .start_execution()
            .state_machine_arn(machine_arn)
            .input(serde_json::to_string(message)?)
            .send()
            .await
            .map_err(Error::from)?;

        execution
            .execution_arn
            .ok_or_else(|| RuntimeError::MissingField("executionArn".into()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::*;
    use aws_sdk_sfn::{Client, Config};
    use aws_smithy_client::{erase::DynConnector, test_connection::TestConnection};
    use aws_smithy_http::body::SdkBody;
    use serde_json::json;

    #[tokio::test]
    async fn test_run_state_machine() -> Result<(), RuntimeError> {
        // GIVEN a state machine accepting executions
        let conn = TestConnection::new(vec![(
            get_request_builder("states")
                .header("content-type", "application/x-amz-json-1.0")
                .header("x-amz-target", "AWSStepFunctions.StartExecution")
                .body(SdkBody::from("{}"))
                .unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::from(
                    r#"{"executionArn":"arn:aws:states:us-west-1:123456789012:execution:sm:run","startDate":1.658059578E9}"#,
                ))
                .unwrap(),
        )]);
        let config = Config::new(&get_mock_config().await);
        let states = StatesClient {
            inner: Client::from_conf_conn(config, DynConnector::new(conn.clone())),
            state_machine_arn: Some("arn:aws:states:us-west-1:123456789012:stateMachine:sm".into()),
        };

        // WHEN starting an execution
        let payload = json!({"bucket": "raw", "key": "engineering/legislators/persons.json"});
        let execution_arn = states
            .run_state_machine(states.state_machine_arn()?, &payload)
            .await?;

        // THEN the execution ARN comes back and the input was the
        // serialized payload
        assert_eq!(
            "arn:aws:states:us-west-1:123456789012:execution:sm:run",
            execution_arn
        );
        let requests = conn.requests();
        let body: Value =
            serde_json::from_slice(requests[0].actual.body().bytes().expect("captured body"))?;
        assert_eq!(
            json!("arn:aws:states:us-west-1:123456789012:stateMachine:sm"),
            body["stateMachineArn"]
        );
        let input: Value = serde_json::from_str(body["input"].as_str().expect("input string"))?;
        assert_eq!(payload, input);

        Ok(())
    }

    #[tokio::test]
    async fn test_state_machine_arn_unscoped() {
        let config = Config::new(&get_mock_config().await);
        let states = StatesClient {
            inner: Client::from_conf_conn(
                config,
                DynConnector::new(TestConnection::<SdkBody>::new(vec![])),
            ),
            state_machine_arn: None,
        };

        let result = states.state_machine_arn();
        assert!(matches!(result, Err(RuntimeError::MissingScope(_))));
    }
}
