use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use serde_derive::Deserialize;
use serde_json::json;

use crate::{errors::AppError, service_provider::slack::SlackMessage};
use super::{header_context, json_response, parse_json, AppState};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PostMessageRequest {
    channel_id: String,
    message: String,
    workspace_id: Option<String>,
}

pub async fn handle_post_message(state: &AppState, request: &ApiGatewayProxyRequest, body: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    let context = header_context(state, request)?;
    let body: PostMessageRequest = parse_json(body)?;

    let workspace_id = match body.workspace_id {
        Some(workspace_id) => workspace_id,
        None => state.contentful
            .get_installation_parameters(&context.host, &context.space_id, &context.environment_id)
            .await?
            .and_then(|parameters| parameters.workspaces.into_iter().next())
            .ok_or_else(|| AppError::not_found("No Slack workspace connected"))?,
    };

    let auth_token = state.auth_tokens.get(&workspace_id, &context).await?;
    state.slack.post_message(&auth_token.token, &body.channel_id, &SlackMessage::text(&body.message)).await?;

    Ok(json_response(200, &json!({ "ok": true })))
}
