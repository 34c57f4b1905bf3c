use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;
use serde_derive::{Serialize, Deserialize};
use tracing::info;

use crate::errors::AppError;

#[derive(Serialize, Deserialize, Clone)]
pub struct Secrets {
    pub encryption_key: String,
    pub slack_client_id: String,
    pub slack_client_secret: String,
    pub slack_signing_secret: String,
    pub contentful_signing_secret: String,
    pub contentful_access_token: String,
}

// Debug is hand written so secrets never end up in logs.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("slack_client_id", &self.slack_client_id)
            .finish_non_exhaustive()
    }
}

pub struct SecretsClient {
    client: Client,
}

impl SecretsClient {
    pub fn new(config: &SdkConfig) -> SecretsClient {
        SecretsClient{ client: Client::new(config) }
    }

    pub async fn get_secret(&self, name: &str) -> Result<Secrets, AppError> {
        info!(secret = name, "Querying secret value");

        let result = self.client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await?;

        let secrets_value = result.secret_string()
            .ok_or_else(|| AppError::UnexpectedError(format!("Couldn't get secret value for {}", name)))?;

        parse_secrets(secrets_value)
    }
}

pub fn parse_secrets(json: &str) -> Result<Secrets, AppError> {
    Ok(serde_json::from_str(json)?)
}
