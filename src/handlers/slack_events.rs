use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use serde_derive::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{errors::AppError, signature::verify_slack_request, timestamp::get_current_timestamp_utc};
use super::{json_response, parse_json, AppState};

#[derive(Deserialize, Debug)]
struct SlackEvent {
    #[serde(rename = "type")]
    event_type: String,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackEventEnvelope {
    UrlVerification { challenge: String },
    EventCallback { team_id: String, event: SlackEvent },
    #[serde(other)]
    Unsupported,
}

/// Slack Events API endpoint, used to drop tokens once Slack revokes them.
pub async fn handle_slack_event(state: &AppState, request: &ApiGatewayProxyRequest, body: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    verify_slack_request(&state.slack_signing_secret, &request.headers, body, get_current_timestamp_utc().timestamp())?;

    match parse_json::<SlackEventEnvelope>(body)? {
        SlackEventEnvelope::UrlVerification { challenge } => Ok(json_response(200, &json!({ "challenge": challenge }))),
        SlackEventEnvelope::EventCallback { team_id, event } if matches!(event.event_type.as_str(), "tokens_revoked" | "app_uninstalled") => {
            info!(workspace_id = %team_id, event = %event.event_type, "Slack revoked access");
            state.auth_tokens.delete_by_workspace_id(&team_id).await?;
            Ok(json_response(200, &json!({ "ok": true })))
        }
        _ => Ok(json_response(200, &json!({ "ok": true }))),
    }
}
