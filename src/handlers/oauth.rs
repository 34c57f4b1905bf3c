use aws_lambda_events::{event::apigw::ApiGatewayProxyResponse, query_map::QueryMap};
use tracing::{info, warn};

use crate::{auth_tokens::InstallationContext, errors::AppError};
use super::{response, AppState};

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn redirect_url(frontend_url: &str, params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    let separator = if frontend_url.contains('?') { '&' } else { '?' };

    format!("{}{}{}", frontend_url, separator, query)
}

/// Page that forwards the OAuth outcome to the app frontend from the browser.
pub fn redirect_page(url: &str) -> String {
    let escaped = escape_html(url);
    let script_url = serde_json::to_string(url)
        .unwrap_or_default()
        .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta http-equiv="refresh" content="0;url={escaped}">
    <title>Connecting Slack</title>
  </head>
  <body>
    <p>Redirecting&hellip; <a href="{escaped}">Continue</a></p>
    <script>window.location.replace({script_url});</script>
  </body>
</html>
"#
    )
}

pub async fn handle_oauth(state: &AppState, query: &QueryMap) -> ApiGatewayProxyResponse {
    let frontend_url = &state.config.frontend_url;

    if let Some(error) = query.first("error") {
        info!(error, "Slack authorization was cancelled");
        let url = redirect_url(frontend_url, &[("result", "cancel")]);
        return response(200, "text/html; charset=utf-8", redirect_page(&url));
    }

    let (Some(code), Some(space_id), Some(environment_id)) = (query.first("code"), query.first("spaceId"), query.first("environmentId")) else {
        let url = redirect_url(frontend_url, &[("result", "error"), ("errorMessage", "Missing authorization parameters")]);
        return response(200, "text/html; charset=utf-8", redirect_page(&url));
    };

    let context = InstallationContext {
        space_id: space_id.to_string(),
        environment_id: environment_id.to_string(),
        host: state.host().to_string(),
    };

    let url = match state.auth_tokens.validate(code, &context).await {
        Ok(grant) => redirect_url(frontend_url, &[
            ("accessToken", grant.token.as_str()),
            ("refreshToken", grant.refresh_token.as_str()),
            ("state", grant.slack_workspace_id.as_str()),
            ("result", "ok"),
        ]),
        Err(AppError::Conflict { message, .. }) => {
            warn!(space_id, message = %message, "Slack app has no token rotation");
            redirect_url(frontend_url, &[("result", "error")])
        }
        Err(err) => {
            warn!(space_id, error = %err, "Slack authorization failed");
            let message = err.to_string();
            redirect_url(frontend_url, &[("result", "error"), ("errorMessage", message.as_str())])
        }
    };

    response(200, "text/html; charset=utf-8", redirect_page(&url))
}
