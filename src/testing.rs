//! Test doubles for the Slack and Contentful APIs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    errors::AppError,
    service_provider::{
        contentful::{ContentType, ContentfulApi, Entry, InstallationParameters, LinkSys},
        slack::{Channel, SlackApi, SlackMessage, SlackOauthResponse, SlackTeam, Workspace, WorkspaceIcon},
    },
};

pub fn oauth_response(token: &str, refresh_token: &str, workspace_id: &str, expires_in: i64) -> SlackOauthResponse {
    SlackOauthResponse {
        access_token: Some(token.to_string()),
        refresh_token: Some(refresh_token.to_string()),
        expires_in: Some(expires_in),
        team: Some(SlackTeam { id: Some(workspace_id.to_string()), name: Some("Acme".to_string()) }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub token: String,
    pub channel_id: String,
    pub message: SlackMessage,
}

pub struct FakeSlack {
    pub exchange_response: Mutex<SlackOauthResponse>,
    /// `Err` holds the Slack error code returned by `oauth.v2.access`.
    pub refresh_response: Mutex<Result<SlackOauthResponse, String>>,
    pub refresh_calls: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<PostedMessage>>,
    pub failing_channel: Mutex<Option<String>>,
    pub channels: Vec<Channel>,
}

impl Default for FakeSlack {
    fn default() -> FakeSlack {
        FakeSlack {
            exchange_response: Mutex::new(oauth_response("xoxe.xoxb-code", "xoxe-1-code", "T1", 43200)),
            refresh_response: Mutex::new(Ok(oauth_response("xoxe.xoxb-fresh", "xoxe-1-fresh", "T1", 43200))),
            refresh_calls: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
            failing_channel: Mutex::new(None),
            channels: vec![
                Channel { id: "C1".to_string(), name: "general".to_string(), is_private: false, is_member: true },
                Channel { id: "C2".to_string(), name: "content".to_string(), is_private: true, is_member: true },
            ],
        }
    }
}

impl FakeSlack {
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }

    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().unwrap().clone()
    }

    pub fn fail_refresh_with(&self, error: &str) {
        *self.refresh_response.lock().unwrap() = Err(error.to_string());
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn exchange_code(&self, _code: &str) -> Result<SlackOauthResponse, AppError> {
        Ok(self.exchange_response.lock().unwrap().clone())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<SlackOauthResponse, AppError> {
        self.refresh_calls.lock().unwrap().push(refresh_token.to_string());
        self.refresh_response.lock().unwrap().clone().map_err(AppError::SlackError)
    }

    async fn post_message(&self, token: &str, channel_id: &str, message: &SlackMessage) -> Result<(), AppError> {
        if self.failing_channel.lock().unwrap().as_deref() == Some(channel_id) {
            return Err(AppError::SlackError("channel_not_found".to_string()));
        }

        self.posted.lock().unwrap().push(PostedMessage {
            token: token.to_string(),
            channel_id: channel_id.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn get_workspace(&self, _token: &str, workspace_id: &str) -> Result<Workspace, AppError> {
        Ok(Workspace {
            id: workspace_id.to_string(),
            name: "Acme".to_string(),
            domain: Some("acme".to_string()),
            icon: WorkspaceIcon::default(),
        })
    }

    async fn list_channels(&self, _token: &str) -> Result<Vec<Channel>, AppError> {
        Ok(self.channels.clone())
    }

    async fn get_channel(&self, _token: &str, channel_id: &str) -> Result<Channel, AppError> {
        self.channels
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| AppError::SlackError("channel_not_found".to_string()))
    }
}

#[derive(Default)]
pub struct FakeContentful {
    pub parameters: Mutex<Option<InstallationParameters>>,
    pub entry: Mutex<Option<Entry>>,
    pub content_type: Mutex<Option<ContentType>>,
    pub default_locale: Mutex<Option<String>>,
    pub entry_calls: Mutex<usize>,
}

impl FakeContentful {
    pub fn with_parameters(parameters: InstallationParameters) -> FakeContentful {
        let contentful = FakeContentful::default();
        *contentful.parameters.lock().unwrap() = Some(parameters);
        *contentful.default_locale.lock().unwrap() = Some("en-US".to_string());
        *contentful.content_type.lock().unwrap() = Some(ContentType {
            sys: LinkSys { id: "post".to_string(), link_type: None },
            name: "Post".to_string(),
            display_field: Some("title".to_string()),
        });
        contentful
    }

    pub fn entry_call_count(&self) -> usize {
        *self.entry_calls.lock().unwrap()
    }
}

#[async_trait]
impl ContentfulApi for FakeContentful {
    async fn get_installation_parameters(&self, _host: &str, _space_id: &str, _environment_id: &str) -> Result<Option<InstallationParameters>, AppError> {
        Ok(self.parameters.lock().unwrap().clone())
    }

    async fn get_entry(&self, _host: &str, _space_id: &str, _environment_id: &str, entry_id: &str) -> Result<Entry, AppError> {
        *self.entry_calls.lock().unwrap() += 1;
        self.entry.lock().unwrap().clone()
            .ok_or_else(|| AppError::not_found(format!("Entry {} not found", entry_id)))
    }

    async fn get_content_type(&self, _host: &str, _space_id: &str, _environment_id: &str, content_type_id: &str) -> Result<ContentType, AppError> {
        self.content_type.lock().unwrap().clone()
            .ok_or_else(|| AppError::not_found(format!("Content type {} not found", content_type_id)))
    }

    async fn get_default_locale(&self, _host: &str, _space_id: &str, _environment_id: &str) -> Result<Option<String>, AppError> {
        Ok(self.default_locale.lock().unwrap().clone())
    }
}
