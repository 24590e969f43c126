use crate::{client::Scope, error::RuntimeError, ssm::SsmClient};

/// KMS key configuration.
///
/// The keys are only ever handed to S3 as SSE-KMS parameters, so this is
/// configuration rather than an API client: the domain data key, plus the
/// team data and infrastructure keys when the scope names a team.
pub struct KmsKeys {
    data_kms_key: String,
    team_data_kms_key: Option<String>,
    team_infra_kms_key: Option<String>,
}

impl KmsKeys {
    /// Resolve the key ARNs from SSM for the given scope.
    #[tracing::instrument(skip(ssm))]
    pub async fn new(ssm: &SsmClient, scope: &Scope) -> Result<KmsKeys, RuntimeError> {
        let data_kms_key = ssm.get_parameter("/SDLF2/KMS/KeyArn").await?;
        let (team_data_kms_key, team_infra_kms_key) = match &scope.team {
            Some(team) => (
                Some(
                    ssm.get_parameter(&format!("/SDLF/KMS/{}/DataKeyId", team))
                        .await?,
                ),
                Some(
                    ssm.get_parameter(&format!("/SDLF/KMS/{}/InfraKeyId", team))
                        .await?,
                ),
            ),
            None => (None, None),
        };

        Ok(KmsKeys {
            data_kms_key,
            team_data_kms_key,
            team_infra_kms_key,
        })
    }

    /// Domain-wide data key ARN
    pub fn data_kms_key(&self) -> &str {
        &self.data_kms_key
    }

    /// Team data key id, available when scoped to a team.
    pub fn team_data_kms_key(&self) -> Result<&str, RuntimeError> {
        self.team_data_kms_key
            .as_deref()
            .ok_or(RuntimeError::MissingScope("team"))
    }

    /// Team infrastructure key id, available when scoped to a team.
    pub fn team_infra_kms_key(&self) -> Result<&str, RuntimeError> {
        self.team_infra_kms_key
            .as_deref()
            .ok_or(RuntimeError::MissingScope("team"))
    }
}
