use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use serde_json::{json, Value};

use crate::errors::AppError;
use super::{header, header_context, json_response, parse_json, AppState, UUID_HEADER};

/// Checks `{refreshToken: string}` and reports violations in validator style.
pub fn validate_token_request(body: &Value) -> Result<String, AppError> {
    let invalid = |instance_path: &str, message: &str| AppError::UnprocessableEntity {
        message: "Invalid request body".to_string(),
        details: vec![json!({ "instancePath": instance_path, "message": message })],
    };

    let object = body.as_object().ok_or_else(|| invalid("", "must be object"))?;

    match object.get("refreshToken") {
        None => Err(invalid("", "must have required property 'refreshToken'")),
        Some(Value::String(token)) if !token.is_empty() => Ok(token.clone()),
        Some(Value::String(_)) => Err(invalid("/refreshToken", "must NOT have fewer than 1 characters")),
        Some(_) => Err(invalid("/refreshToken", "must be string")),
    }
}

pub async fn handle_create_token(state: &AppState, request: &ApiGatewayProxyRequest, body: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    let context = header_context(state, request)?;
    let installation_uuid = header(request, UUID_HEADER).ok_or_else(|| AppError::not_found("Missing installation id"))?;

    let body: Value = parse_json(body)?;
    let refresh_token = validate_token_request(&body)?;

    let auth_token = state.auth_tokens.put(&refresh_token, &context, installation_uuid).await?;

    Ok(json_response(201, &json!({ "token": auth_token.token })))
}
