use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{info, warn};

use crate::{
    db::{dynamodb_client::{get_attribute, Item}, AuthToken, SingleTableClient, AUTH_TOKEN_ENTITY_TYPE},
    encryption::Encryption,
    errors::AppError,
    service_provider::{contentful::ContentfulApi, slack::{SlackApi, SlackOauthResponse}},
    timestamp::now_millis,
};

/// Tokens are refreshed once they are more than this far past `expires_at`.
pub const EXPIRY_GRACE_MILLIS: i64 = 60_000;

/// Slack error code meaning the refresh token was revoked or already rotated.
pub const INVALID_REFRESH_TOKEN: &str = "invalid_refresh_token";

/// The Contentful installation a request acts for.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationContext {
    pub space_id: String,
    pub environment_id: String,
    /// Management API host the installation lives on, e.g. `api.contentful.com`.
    pub host: String,
}

/// Result of the authorization code exchange, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedGrant {
    pub token: String,
    pub refresh_token: String,
    pub slack_workspace_id: String,
}

struct RotatedCredentials {
    token: String,
    refresh_token: String,
    slack_workspace_id: String,
    expires_at: i64,
}

fn validate_grant(response: SlackOauthResponse) -> Result<ValidatedGrant, AppError> {
    // Checked first: without rotation the rest of the response is irrelevant.
    let Some(refresh_token) = response.refresh_token.clone() else {
        return Err(AppError::conflict("Token rotation is not enabled for the Slack app"));
    };

    let slack_workspace_id = response.workspace_id()
        .ok_or_else(|| AppError::OAuthProviderError("Slack did not return a workspace id".to_string()))?
        .to_string();
    let token = response.access_token
        .ok_or_else(|| AppError::OAuthProviderError("Slack did not return an access token".to_string()))?;

    Ok(ValidatedGrant { token, refresh_token, slack_workspace_id })
}

fn rotated_credentials(response: SlackOauthResponse) -> Result<RotatedCredentials, AppError> {
    let expires_in = response.expires_in
        .ok_or_else(|| AppError::OAuthProviderError("Slack did not return an expiry".to_string()))?;
    let grant = validate_grant(response)?;

    Ok(RotatedCredentials {
        token: grant.token,
        refresh_token: grant.refresh_token,
        slack_workspace_id: grant.slack_workspace_id,
        expires_at: now_millis() + expires_in * 1000,
    })
}

pub struct AuthTokenRepository {
    table: SingleTableClient,
    slack: Arc<dyn SlackApi>,
    contentful: Arc<dyn ContentfulApi>,
    encryption: Encryption,
}

impl AuthTokenRepository {
    pub fn new(table: SingleTableClient, slack: Arc<dyn SlackApi>, contentful: Arc<dyn ContentfulApi>, encryption: Encryption) -> AuthTokenRepository {
        AuthTokenRepository { table, slack, contentful, encryption }
    }

    /// Exchanges an OAuth authorization code. The grant is returned to the caller and only stored by [`Self::put`].
    pub async fn validate(&self, code: &str, context: &InstallationContext) -> Result<ValidatedGrant, AppError> {
        info!(space_id = %context.space_id, environment_id = %context.environment_id, "Validating Slack authorization code");

        let response = self.slack.exchange_code(code).await?;
        validate_grant(response)
    }

    pub async fn put(&self, refresh_token: &str, context: &InstallationContext, installation_uuid: &str) -> Result<AuthToken, AppError> {
        let credentials = rotated_credentials(self.slack.refresh_token(refresh_token).await?)?;

        let auth_token = AuthToken {
            token: credentials.token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            expires_at: credentials.expires_at,
            space_id: context.space_id.clone(),
            environment_id: context.environment_id.clone(),
            slack_workspace_id: credentials.slack_workspace_id.clone(),
            installation_uuid: Some(installation_uuid.to_string()),
        };

        self.propagate(&credentials).await?;
        self.save(&auth_token).await?;

        info!(workspace_id = %auth_token.slack_workspace_id, installation_uuid, "Stored Slack token");
        Ok(auth_token)
    }

    pub async fn get(&self, workspace_id: &str, context: &InstallationContext) -> Result<AuthToken, AppError> {
        let installation_uuid = self.contentful
            .get_installation_parameters(&context.host, &context.space_id, &context.environment_id)
            .await?
            .and_then(|parameters| parameters.installation_uuid)
            .ok_or_else(|| AppError::not_found("Could not find installation"))?;

        let item = self.table
            .get(AUTH_TOKEN_ENTITY_TYPE, &installation_uuid)
            .await?
            .ok_or_else(|| AppError::not_found("Could not find token"))?;
        let auth_token = AuthToken::from_item(&item, &self.encryption)?;

        if auth_token.slack_workspace_id != workspace_id {
            warn!(workspace_id, stored = %auth_token.slack_workspace_id, "Stored token belongs to another workspace");
            return Err(AppError::not_found("Could not find token"));
        }

        if !auth_token.is_expired(now_millis(), EXPIRY_GRACE_MILLIS) {
            return Ok(auth_token);
        }

        info!(workspace_id, "Slack token expired, refreshing");
        let refreshed = self.slack
            .refresh_token(&auth_token.refresh_token)
            .await
            .and_then(rotated_credentials);

        match refreshed {
            Ok(credentials) => {
                let refreshed_token = auth_token.with_credentials(&credentials.token, &credentials.refresh_token, credentials.expires_at);
                let credentials = RotatedCredentials { slack_workspace_id: auth_token.slack_workspace_id.clone(), ..credentials };

                // Written by key, the workspace index may not list this record yet.
                self.save(&refreshed_token).await?;
                if let Err(err) = self.propagate(&credentials).await {
                    warn!(workspace_id, error = %err, "Failed to propagate refreshed Slack token");
                }
                Ok(refreshed_token)
            }
            Err(AppError::SlackError(error)) if error == INVALID_REFRESH_TOKEN => {
                warn!(workspace_id, "Refresh token rejected by Slack, revoking workspace tokens");
                if let Err(err) = self.delete_by_workspace_id(workspace_id).await {
                    warn!(workspace_id, error = %err, "Failed to revoke workspace tokens");
                }
                Err(AppError::not_found("Could not refresh token"))
            }
            Err(err) => {
                warn!(workspace_id, error = %err, "Failed to refresh Slack token");
                Err(AppError::not_found("Could not refresh token"))
            }
        }
    }

    /// Stored record for an installation, without refreshing it.
    pub async fn find(&self, installation_uuid: &str) -> Result<Option<AuthToken>, AppError> {
        self.table
            .get(AUTH_TOKEN_ENTITY_TYPE, installation_uuid)
            .await?
            .map(|item| AuthToken::from_item(&item, &self.encryption))
            .transpose()
    }

    pub async fn delete_by_workspace_id(&self, workspace_id: &str) -> Result<(), AppError> {
        let items = self.table.query_by_workspace_id(AUTH_TOKEN_ENTITY_TYPE, workspace_id).await?;
        info!(workspace_id, count = items.len(), "Deleting workspace tokens");

        let uuids = items.iter()
            .map(|item| get_attribute(item, "uuid"))
            .collect::<Result<Vec<_>, _>>()?;

        try_join_all(uuids.iter().map(|uuid| self.table.delete(AUTH_TOKEN_ENTITY_TYPE, uuid))).await?;
        Ok(())
    }

    async fn save(&self, auth_token: &AuthToken) -> Result<Item, AppError> {
        self.table.put(
            AUTH_TOKEN_ENTITY_TYPE,
            &auth_token.record_id(),
            &[auth_token.space_id.as_str(), auth_token.environment_id.as_str()],
            auth_token.to_item(&self.encryption)?,
        ).await
    }

    /// Slack rotates one refresh token per workspace, so every record of the workspace receives the new credentials.
    async fn propagate(&self, credentials: &RotatedCredentials) -> Result<(), AppError> {
        let items = self.table.query_by_workspace_id(AUTH_TOKEN_ENTITY_TYPE, &credentials.slack_workspace_id).await?;

        let mut updates = Vec::with_capacity(items.len());
        for mut item in items {
            let uuid = get_attribute(&item, "uuid")?;
            let container = get_attribute(&item, "container")?;

            item.insert("token".to_string(), AttributeValue::S(self.encryption.seal(&credentials.token)?));
            item.insert("refreshToken".to_string(), AttributeValue::S(self.encryption.seal(&credentials.refresh_token)?));
            item.insert("expiresAt".to_string(), AttributeValue::N(credentials.expires_at.to_string()));
            item.insert("updatedAt".to_string(), AttributeValue::S(Utc::now().to_rfc3339()));
            updates.push((uuid, container, item));
        }

        try_join_all(updates.into_iter().map(|(uuid, container, item)| async move {
            let segments: Vec<&str> = container.split('/').collect();
            self.table.put(AUTH_TOKEN_ENTITY_TYPE, &uuid, &segments, item).await
        })).await?;

        Ok(())
    }
}
