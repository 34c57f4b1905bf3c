use async_trait::async_trait;
use reqwest::{Method, Client};
use serde_derive::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::{errors::AppError, base64::encode_with_pad};

#[derive(Deserialize, Debug)]
struct SlackResponse<T> {
    ok: bool,
    error: Option<String>,

    #[serde(flatten)]
    data: T,
}

#[derive(Deserialize, Debug)]
struct TeamResponse {
    team: Workspace,
}

#[derive(Deserialize, Debug)]
struct ChannelResponse {
    channel: Channel,
}

#[derive(Deserialize, Debug)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChannelsResponse {
    #[serde(default)]
    channels: Vec<Channel>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize, Debug)]
struct PostMessageResponse {
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_member: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct WorkspaceIcon {
    pub image_68: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub domain: Option<String>,
    #[serde(default)]
    pub icon: WorkspaceIcon,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SlackTeam {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Raw `oauth.v2.access` payload. Every field is optional because Slack omits
/// the rotation fields when token rotation is disabled for the app.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SlackOauthResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires.
    pub expires_in: Option<i64>,
    pub team: Option<SlackTeam>,
}

impl SlackOauthResponse {
    pub fn workspace_id(&self) -> Option<&str> {
        self.team.as_ref().and_then(|team| team.id.as_deref())
    }
}

/// A Block Kit message with the plain text shown in notifications.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SlackMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Value>,
}

impl SlackMessage {
    pub fn text(text: &str) -> SlackMessage {
        SlackMessage { text: text.to_string(), blocks: Vec::new() }
    }
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<SlackOauthResponse, AppError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<SlackOauthResponse, AppError>;

    async fn post_message(&self, token: &str, channel_id: &str, message: &SlackMessage) -> Result<(), AppError>;

    async fn get_workspace(&self, token: &str, workspace_id: &str) -> Result<Workspace, AppError>;

    async fn list_channels(&self, token: &str) -> Result<Vec<Channel>, AppError>;

    async fn get_channel(&self, token: &str, channel_id: &str) -> Result<Channel, AppError>;
}

pub struct Slack {
    http_client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl Slack {
    pub fn new(http_client: Client, base_url: String, client_id: String, client_secret: String, redirect_uri: String) -> Slack {
        Slack { http_client, base_url, client_id, client_secret, redirect_uri }
    }

    async fn oauth_access(&self, params: &[(&str, &str)]) -> Result<SlackOauthResponse, AppError> {
        let url = format!("{}/oauth.v2.access", self.base_url);
        let credentials = encode_with_pad(format!("{}:{}", self.client_id, self.client_secret).as_bytes());

        let response = self.http_client
            .request(Method::POST, url)
            .header("Authorization", format!("Basic {}", credentials))
            .form(params)
            .send()
            .await?;

        parse_response(response, "oauth.v2.access").await
    }

    async fn send_request<T, Q>(&self, token: &str, endpoint: &str, method: Method, params: Option<&Q>, payload: Option<&Value>) -> Result<T, AppError>
    where
        T: for<'a> serde::Deserialize<'a>,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut request_builder = self.http_client.request(method.clone(), url)
            .bearer_auth(token)
            .header("Content-Type", "application/json; charset=utf-8");

        if let Some(params) = params {
            request_builder = request_builder.query(params);
        }

        if let Some(payload) = payload {
            let body: String = payload.to_string();
            debug!("Slack: {} {}: {}", method.as_str(), endpoint, &body);
            request_builder = request_builder.body(body);
        }

        let response = request_builder
            .send()
            .await?;

        parse_response(response, endpoint).await
    }
}

async fn parse_response<T>(response: reqwest::Response, endpoint: &str) -> Result<T, AppError>
where
    T: for<'a> serde::Deserialize<'a>,
{
    if !response.status().is_success() {
        error!(endpoint, status = %response.status(), "SlackClient: Failed sending request to Slack");
        return Err(AppError::SlackError(format!("Failed sending request to Slack, status: {}", response.status())));
    }

    let response_body = response.text().await?;
    let json_response: SlackResponse<T> = serde_json::from_str(&response_body).map_err(|err| {
        error!(endpoint, "Failed to parse json response from Slack");
        AppError::SlackError(err.to_string())
    })?;

    if json_response.ok {
        Ok(json_response.data)
    } else if let Some(error) = json_response.error {
        error!(endpoint, error = %error, "SlackClient: Failed to call Slack API");
        Err(AppError::SlackError(error))
    } else {
        error!(endpoint, "SlackClient: Unknown error occurred");
        Err(AppError::SlackError("Unknown error".to_string()))
    }
}

#[async_trait]
impl SlackApi for Slack {
    async fn exchange_code(&self, code: &str) -> Result<SlackOauthResponse, AppError> {
        info!("Swap slack authorization code for tokens");
        self.oauth_access(&[("code", code), ("redirect_uri", &self.redirect_uri)]).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<SlackOauthResponse, AppError> {
        info!("Refresh slack access token");
        self.oauth_access(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)]).await
    }

    async fn post_message(&self, token: &str, channel_id: &str, message: &SlackMessage) -> Result<(), AppError> {
        let payload = json!({
            "channel": channel_id,
            "text": message.text,
            "blocks": message.blocks,
        });

        let _: PostMessageResponse = self.send_request::<_, ()>(token, "chat.postMessage", Method::POST, None, Some(&payload)).await?;
        Ok(())
    }

    async fn get_workspace(&self, token: &str, workspace_id: &str) -> Result<Workspace, AppError> {
        let params = [("team", workspace_id)];

        let response: TeamResponse = self.send_request(token, "team.info", Method::GET, Some(&params[..]), None).await?;
        Ok(response.team)
    }

    async fn list_channels(&self, token: &str) -> Result<Vec<Channel>, AppError> {
        let mut channels = Vec::new();
        let mut cursor = String::new();

        loop {
            let params = [
                ("types", "public_channel,private_channel"),
                ("exclude_archived", "true"),
                ("limit", "1000"),
                ("cursor", cursor.as_str()),
            ];

            let response: ChannelsResponse = self.send_request(token, "conversations.list", Method::GET, Some(&params[..]), None).await?;
            channels.extend(response.channels);

            match response.response_metadata.and_then(|m| m.next_cursor).filter(|c| !c.is_empty()) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(channels)
    }

    async fn get_channel(&self, token: &str, channel_id: &str) -> Result<Channel, AppError> {
        let params = [("channel", channel_id)];

        let response: ChannelResponse = self.send_request(token, "conversations.info", Method::GET, Some(&params[..]), None).await?;
        Ok(response.channel)
    }
}
