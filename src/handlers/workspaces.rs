use aws_lambda_events::event::apigw::ApiGatewayProxyResponse;
use serde_json::json;

use crate::{auth_tokens::InstallationContext, db::AuthToken, errors::AppError};
use super::{json_response, AppState};

async fn token_for(state: &AppState, space_id: &str, environment_id: &str, workspace_id: &str) -> Result<AuthToken, AppError> {
    let context = InstallationContext {
        space_id: space_id.to_string(),
        environment_id: environment_id.to_string(),
        host: state.host().to_string(),
    };

    state.auth_tokens.get(workspace_id, &context).await
}

pub async fn handle_get_workspace(state: &AppState, space_id: &str, environment_id: &str, workspace_id: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    let auth_token = token_for(state, space_id, environment_id, workspace_id).await?;
    let workspace = state.slack.get_workspace(&auth_token.token, workspace_id).await?;

    Ok(json_response(200, &json!(workspace)))
}

pub async fn handle_list_channels(state: &AppState, space_id: &str, environment_id: &str, workspace_id: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    let auth_token = token_for(state, space_id, environment_id, workspace_id).await?;
    let channels = state.slack.list_channels(&auth_token.token).await?;

    Ok(json_response(200, &json!(channels)))
}

pub async fn handle_get_channel(state: &AppState, space_id: &str, environment_id: &str, workspace_id: &str, channel_id: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    let auth_token = token_for(state, space_id, environment_id, workspace_id).await?;
    let channel = state.slack.get_channel(&auth_token.token, channel_id).await?;

    Ok(json_response(200, &json!(channel)))
}
