use derive_more::Display;

use crate::errors::AppError;

/// Entry actions that can trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EventKey {
    #[display("create")]
    Create,
    #[display("publish")]
    Publish,
    #[display("unpublish")]
    Unpublish,
    #[display("delete")]
    Delete,
}

impl EventKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKey::Create => "create",
            EventKey::Publish => "publish",
            EventKey::Unpublish => "unpublish",
            EventKey::Delete => "delete",
        }
    }

    pub fn from_action(action: &str) -> Option<EventKey> {
        match action {
            "create" => Some(EventKey::Create),
            "publish" => Some(EventKey::Publish),
            "unpublish" => Some(EventKey::Unpublish),
            "delete" => Some(EventKey::Delete),
            _ => None,
        }
    }
}

/// Maps an `x-contentful-topic` value such as `ContentManagement.Entry.publish`
/// to its event key. Unsupported actions yield `None`.
pub fn convert_to_event_key(topic: Option<&str>) -> Result<Option<EventKey>, AppError> {
    let topic = topic.ok_or_else(|| AppError::not_found("Missing event topic"))?;

    Ok(topic.rsplit('.').next().and_then(EventKey::from_action))
}
