use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use tracing::info;

use crate::{errors::AppError, events::convert_to_event_key, service_provider::contentful::Entry};
use super::{header, no_content, parse_json, AppState, TOPIC_HEADER};

/// Webhook deliveries that need no message are acknowledged like handled ones.
pub async fn handle_event(state: &AppState, request: &ApiGatewayProxyRequest, body: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    let event_key = convert_to_event_key(header(request, TOPIC_HEADER))?;
    let entry: Entry = parse_json(body)?;
    let space_id = entry.space_id().ok_or_else(|| AppError::not_found("Event has no space"))?;
    let environment_id = entry.environment_id().ok_or_else(|| AppError::not_found("Event has no environment"))?;
    let host = state.host();

    let parameters = match state.events.get_installation_parameters(space_id, environment_id, host).await {
        Ok(Some(parameters)) => parameters,
        Ok(None) => {
            info!(space_id, environment_id, "No notifications configured");
            return Ok(no_content());
        }
        Err(AppError::NotFound(reason)) => {
            info!(space_id, environment_id, reason = %reason, "Installation is not connected to Slack");
            return Ok(no_content());
        }
        Err(err) => return Err(err),
    };

    let Some(event_key) = event_key else {
        info!(topic = ?header(request, TOPIC_HEADER), "Ignoring unsupported event");
        return Ok(no_content());
    };

    if parameters.active == Some(false) {
        info!(space_id, environment_id, "Notifications are disabled");
        return Ok(no_content());
    }

    let Some(workspace_id) = parameters.workspaces.first() else {
        return Ok(no_content());
    };

    state.events
        .send_messages_for_notifications(&parameters.notifications, event_key, workspace_id, &entry, host)
        .await?;

    Ok(no_content())
}
