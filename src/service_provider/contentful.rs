use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::errors::AppError;

const CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LinkSys {
    pub id: String,
    #[serde(rename = "linkType", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Link {
    pub sys: LinkSys,
}

impl Link {
    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    pub space: Option<Link>,
    pub environment: Option<Link>,
    pub content_type: Option<Link>,
    pub created_by: Option<Link>,
    pub published_by: Option<Link>,
    pub deleted_by: Option<Link>,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An entry as sent in webhook bodies and returned by the management API.
/// Field values are keyed by field id, then by locale code in sorted order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Entry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: HashMap<String, BTreeMap<String, Value>>,
}

impl Entry {
    pub fn space_id(&self) -> Option<&str> {
        self.sys.space.as_ref().map(Link::id)
    }

    pub fn environment_id(&self) -> Option<&str> {
        self.sys.environment.as_ref().map(Link::id)
    }

    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type.as_ref().map(Link::id)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    pub sys: LinkSys,
    pub name: String,
    pub display_field: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Locale {
    pub code: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Deserialize, Debug)]
struct Collection<T> {
    items: Vec<T>,
}

#[derive(Deserialize, Debug)]
struct AppInstallation {
    parameters: Option<InstallationParameters>,
}

/// One notification rule configured on the app's config screen.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SlackNotification {
    pub selected_channel: Option<String>,
    #[serde(default)]
    pub selected_content_type: String,
    #[serde(default)]
    pub selected_event: HashMap<String, bool>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstallationParameters {
    #[serde(default)]
    pub workspaces: Vec<String>,
    #[serde(default)]
    pub notifications: Vec<SlackNotification>,
    pub active: Option<bool>,
    pub installation_uuid: Option<String>,
}

#[async_trait]
pub trait ContentfulApi: Send + Sync {
    /// `None` when the app is not installed in the environment or has no parameters.
    async fn get_installation_parameters(&self, host: &str, space_id: &str, environment_id: &str) -> Result<Option<InstallationParameters>, AppError>;

    async fn get_entry(&self, host: &str, space_id: &str, environment_id: &str, entry_id: &str) -> Result<Entry, AppError>;

    async fn get_content_type(&self, host: &str, space_id: &str, environment_id: &str, content_type_id: &str) -> Result<ContentType, AppError>;

    async fn get_default_locale(&self, host: &str, space_id: &str, environment_id: &str) -> Result<Option<String>, AppError>;
}

pub struct Contentful {
    http_client: Client,
    access_token: String,
    app_definition_id: String,
}

pub fn base_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

impl Contentful {
    pub fn new(http_client: Client, access_token: String, app_definition_id: String) -> Contentful {
        Contentful { http_client, access_token, app_definition_id }
    }

    async fn get<T>(&self, host: &str, path: &str) -> Result<Option<T>, AppError>
    where
        T: for<'a> serde::Deserialize<'a>,
    {
        let url = format!("{}{}", base_url(host), path);

        let response = self.http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", CONTENT_TYPE)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                error!(path, %status, "Contentful: request failed");
                Err(AppError::ContentfulError(format!("Request to {} failed with status {}", path, status)))
            }
        }
    }
}

#[async_trait]
impl ContentfulApi for Contentful {
    async fn get_installation_parameters(&self, host: &str, space_id: &str, environment_id: &str) -> Result<Option<InstallationParameters>, AppError> {
        info!(space_id, environment_id, "Loading app installation parameters");
        let path = format!("/spaces/{}/environments/{}/app_installations/{}", space_id, environment_id, self.app_definition_id);

        let installation: Option<AppInstallation> = self.get(host, &path).await?;
        Ok(installation.and_then(|i| i.parameters))
    }

    async fn get_entry(&self, host: &str, space_id: &str, environment_id: &str, entry_id: &str) -> Result<Entry, AppError> {
        let path = format!("/spaces/{}/environments/{}/entries/{}", space_id, environment_id, entry_id);

        self.get(host, &path).await?
            .ok_or_else(|| AppError::not_found(format!("Entry {} not found", entry_id)))
    }

    async fn get_content_type(&self, host: &str, space_id: &str, environment_id: &str, content_type_id: &str) -> Result<ContentType, AppError> {
        let path = format!("/spaces/{}/environments/{}/content_types/{}", space_id, environment_id, content_type_id);

        self.get(host, &path).await?
            .ok_or_else(|| AppError::not_found(format!("Content type {} not found", content_type_id)))
    }

    async fn get_default_locale(&self, host: &str, space_id: &str, environment_id: &str) -> Result<Option<String>, AppError> {
        let path = format!("/spaces/{}/environments/{}/locales", space_id, environment_id);

        let locales: Option<Collection<Locale>> = self.get(host, &path).await?;
        Ok(locales
            .and_then(|c| c.items.into_iter().find(|l| l.default))
            .map(|l| l.code))
    }
}
