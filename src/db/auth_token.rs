use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use crate::{encryption::Encryption, errors::AppError};
use super::dynamodb_client::{get_attribute, get_number_attribute, get_optional_attribute, Item, SLACK_WORKSPACE_ID_ATTRIBUTE};

pub const AUTH_TOKEN_ENTITY_TYPE: &str = "AuthToken";

/// OAuth grant for one Contentful space environment, bound to a Slack workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub refresh_token: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
    pub space_id: String,
    pub environment_id: String,
    pub slack_workspace_id: String,
    pub installation_uuid: Option<String>,
}

impl AuthToken {
    pub fn is_expired(&self, now_millis: i64, grace_millis: i64) -> bool {
        self.expires_at < now_millis - grace_millis
    }

    pub fn with_credentials(&self, token: &str, refresh_token: &str, expires_at: i64) -> AuthToken {
        AuthToken {
            token: token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at,
            ..self.clone()
        }
    }

    pub fn to_item(&self, encryption: &Encryption) -> Result<Item, AppError> {
        let mut item = HashMap::from([
            ("token".to_string(), AttributeValue::S(encryption.seal(&self.token)?)),
            ("refreshToken".to_string(), AttributeValue::S(encryption.seal(&self.refresh_token)?)),
            ("expiresAt".to_string(), AttributeValue::N(self.expires_at.to_string())),
            ("spaceId".to_string(), AttributeValue::S(self.space_id.clone())),
            ("environmentId".to_string(), AttributeValue::S(self.environment_id.clone())),
            (SLACK_WORKSPACE_ID_ATTRIBUTE.to_string(), AttributeValue::S(self.slack_workspace_id.clone())),
            ("updatedAt".to_string(), AttributeValue::S(Utc::now().to_rfc3339())),
        ]);

        if let Some(installation_uuid) = &self.installation_uuid {
            item.insert("installationUuid".to_string(), AttributeValue::S(installation_uuid.clone()));
        }

        Ok(item)
    }

    pub fn from_item(item: &Item, encryption: &Encryption) -> Result<AuthToken, AppError> {
        Ok(AuthToken {
            token: encryption.open(&get_attribute(item, "token")?)?,
            refresh_token: encryption.open(&get_attribute(item, "refreshToken")?)?,
            expires_at: get_number_attribute(item, "expiresAt")?,
            space_id: get_attribute(item, "spaceId")?,
            environment_id: get_attribute(item, "environmentId")?,
            slack_workspace_id: get_attribute(item, SLACK_WORKSPACE_ID_ATTRIBUTE)?,
            installation_uuid: get_optional_attribute(item, "installationUuid"),
        })
    }

    /// The table key of the record. Records written before installation ids existed fall back to the space environment pair.
    pub fn record_id(&self) -> String {
        self.installation_uuid
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.space_id, self.environment_id))
    }
}
