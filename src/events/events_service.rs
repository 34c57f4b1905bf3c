use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{try_join, try_join3, try_join_all};
use serde_json::Value;
use tracing::info;

use crate::{
    auth_tokens::{AuthTokenRepository, InstallationContext},
    errors::AppError,
    service_provider::{
        contentful::{ContentType, ContentfulApi, Entry, InstallationParameters, Link, SlackNotification},
        slack::SlackApi,
    },
};
use super::{message_blocks::create_message_blocks, EventKey};

/// What a notification says about the entry behind a webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub actor_id: Option<String>,
    pub entry_name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// The live entry; absent for deletions.
    pub entity: Option<Entry>,
}

fn link_id(link: &Option<Link>) -> Option<String> {
    link.as_ref().map(|l| l.id().to_string())
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Value of the content type's display field, preferring the default locale.
pub fn resolve_entry_name(entry: &Entry, content_type: &ContentType, default_locale: Option<&str>) -> Option<String> {
    let display_field = content_type.display_field.as_ref()?;
    let values = entry.fields.get(display_field)?;

    default_locale
        .and_then(|locale| values.get(locale))
        .and_then(non_empty_text)
        .or_else(|| values.values().find_map(non_empty_text))
}

pub struct EventsService {
    contentful: Arc<dyn ContentfulApi>,
    slack: Arc<dyn SlackApi>,
    auth_tokens: Arc<AuthTokenRepository>,
}

impl EventsService {
    pub fn new(contentful: Arc<dyn ContentfulApi>, slack: Arc<dyn SlackApi>, auth_tokens: Arc<AuthTokenRepository>) -> EventsService {
        EventsService { contentful, slack, auth_tokens }
    }

    /// `None` when no notification is configured. Rules without a connected workspace are a misconfiguration.
    pub async fn get_installation_parameters(&self, space_id: &str, environment_id: &str, host: &str) -> Result<Option<InstallationParameters>, AppError> {
        let parameters = self.contentful.get_installation_parameters(host, space_id, environment_id).await?;

        let Some(parameters) = parameters.filter(|p| !p.notifications.is_empty()) else {
            return Ok(None);
        };

        if parameters.workspaces.is_empty() {
            return Err(AppError::not_found("No Slack workspace connected"));
        }

        Ok(Some(parameters))
    }

    pub async fn get_resolved_entity(&self, space_id: &str, environment_id: &str, host: &str, event_key: EventKey, event_body: &Entry) -> Result<ResolvedEntity, AppError> {
        let content_type_id = event_body.content_type_id()
            .ok_or_else(|| AppError::not_found("Event has no content type"))?;
        let content_type = self.contentful.get_content_type(host, space_id, environment_id, content_type_id);

        let resolved = match event_key {
            EventKey::Delete => {
                // The entry no longer exists, everything comes from the payload.
                content_type.await?;
                ResolvedEntity {
                    actor_id: link_id(&event_body.sys.deleted_by),
                    entry_name: None,
                    date: event_body.sys.deleted_at,
                    entity: None,
                }
            }
            EventKey::Create => {
                let entry = self.contentful.get_entry(host, space_id, environment_id, &event_body.sys.id);
                let (entry, _) = try_join(entry, content_type).await?;
                ResolvedEntity {
                    actor_id: link_id(&entry.sys.created_by),
                    entry_name: None,
                    date: entry.sys.created_at,
                    entity: Some(entry),
                }
            }
            EventKey::Publish | EventKey::Unpublish => {
                let entry = self.contentful.get_entry(host, space_id, environment_id, &event_body.sys.id);
                let default_locale = self.contentful.get_default_locale(host, space_id, environment_id);
                let (entry, content_type, default_locale) = try_join3(entry, content_type, default_locale).await?;
                let entry_name = resolve_entry_name(&entry, &content_type, default_locale.as_deref());

                if event_key == EventKey::Publish {
                    ResolvedEntity {
                        actor_id: link_id(&entry.sys.published_by),
                        entry_name,
                        date: entry.sys.published_at,
                        entity: Some(entry),
                    }
                } else {
                    // Payloads carry no unpublish timestamp.
                    ResolvedEntity {
                        actor_id: None,
                        entry_name,
                        date: entry.sys.created_at,
                        entity: Some(entry),
                    }
                }
            }
        };

        Ok(resolved)
    }

    /// Posts one message per matching rule and returns how many were sent.
    pub async fn send_messages_for_notifications(&self, notifications: &[SlackNotification], event_key: EventKey, workspace_id: &str, event_body: &Entry, host: &str) -> Result<usize, AppError> {
        let space_id = event_body.space_id().ok_or_else(|| AppError::not_found("Event has no space"))?;
        let environment_id = event_body.environment_id().ok_or_else(|| AppError::not_found("Event has no environment"))?;
        let content_type_id = event_body.content_type_id().unwrap_or_default();

        let context = InstallationContext {
            space_id: space_id.to_string(),
            environment_id: environment_id.to_string(),
            host: host.to_string(),
        };

        let (auth_token, resolved) = try_join(
            self.auth_tokens.get(workspace_id, &context),
            self.get_resolved_entity(space_id, environment_id, host, event_key, event_body),
        ).await?;

        let channels: Vec<&str> = notifications.iter()
            .filter(|n| n.selected_event.get(event_key.as_str()).copied().unwrap_or(false))
            .filter(|n| n.selected_content_type == content_type_id)
            .filter_map(|n| n.selected_channel.as_deref())
            .filter(|channel| !channel.is_empty())
            .collect();

        let message = create_message_blocks(event_key, event_body, &resolved, host);
        info!(event = %event_key, content_type_id, channels = channels.len(), "Sending notifications");

        try_join_all(channels.iter().map(|channel| self.slack.post_message(&auth_token.token, channel, &message))).await?;

        Ok(channels.len())
    }
}
