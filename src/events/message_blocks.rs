use serde_json::{json, Value};

use crate::service_provider::{contentful::Entry, slack::SlackMessage};
use super::{events_service::ResolvedEntity, EventKey};

fn header(event_key: EventKey) -> (&'static str, &'static str) {
    match event_key {
        EventKey::Create => (":pencil2:", "created"),
        EventKey::Publish => (":rocket:", "published"),
        EventKey::Unpublish => (":no_entry_sign:", "unpublished"),
        EventKey::Delete => (":wastebasket:", "deleted"),
    }
}

/// Web app host for a management API host, `api.eu.contentful.com` -> `app.eu.contentful.com`.
fn web_app_host(host: &str) -> String {
    let host = host
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    match host.strip_prefix("api.") {
        Some(rest) => format!("app.{}", rest),
        None => "app.contentful.com".to_string(),
    }
}

pub fn entry_url(entry: &Entry, host: &str) -> String {
    format!(
        "https://{}/spaces/{}/environments/{}/entries/{}",
        web_app_host(host),
        entry.space_id().unwrap_or_default(),
        entry.environment_id().unwrap_or("master"),
        entry.sys.id,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn create_message_blocks(event_key: EventKey, entry: &Entry, resolved: &ResolvedEntity, host: &str) -> SlackMessage {
    let (emoji, verb) = header(event_key);
    let url = entry_url(entry, host);
    let title = format!("An entry was {}", verb);

    let mut blocks: Vec<Value> = vec![json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": format!("{} *{}*", emoji, title) },
    })];

    if let Some(entry_name) = &resolved.entry_name {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("> <{}|{}>", url, escape(entry_name)) },
        }));
    }

    let mut context = Vec::new();
    if let Some(content_type_id) = entry.content_type_id() {
        context.push(format!("Content type: `{}`", content_type_id));
    }
    if let Some(actor_id) = &resolved.actor_id {
        context.push(format!("by user `{}`", actor_id));
    }
    if let Some(date) = resolved.date {
        let fallback = date.format("%B %-d, %Y %H:%M UTC");
        context.push(format!("<!date^{}^{{date_short_pretty}} at {{time}}|{}>", date.timestamp(), fallback));
    }
    if !context.is_empty() {
        blocks.push(json!({
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": context.join(" | ") }],
        }));
    }

    blocks.push(json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": { "type": "plain_text", "text": "Open in Contentful" },
            "url": url,
        }],
    }));

    SlackMessage {
        text: match &resolved.entry_name {
            Some(entry_name) => format!("{}: {}", title, entry_name),
            None => title,
        },
        blocks,
    }
}
