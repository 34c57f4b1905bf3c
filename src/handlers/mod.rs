use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_lambda_events::{event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse}, encodings::Body, http::{HeaderMap, HeaderValue, Method}};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    auth_tokens::{AuthTokenRepository, InstallationContext},
    base64,
    build_http_client,
    config::Config,
    db::SingleTableClient,
    encryption::Encryption,
    errors::AppError,
    events::EventsService,
    secrets::SecretsClient,
    service_provider::{contentful::{Contentful, ContentfulApi}, slack::{Slack, SlackApi}},
    signature::verify_contentful_request,
    timestamp::now_millis,
};

mod events;
mod messages;
mod oauth;
mod slack_events;
mod tokens;
mod workspaces;


pub const SPACE_ID_HEADER: &str = "x-contentful-space-id";
pub const ENVIRONMENT_ID_HEADER: &str = "x-contentful-environment-id";
pub const UUID_HEADER: &str = "x-contentful-uuid";
pub const TOPIC_HEADER: &str = "x-contentful-topic";

/// Everything a request handler needs, built once per Lambda container.
pub struct AppState {
    pub config: Config,
    pub contentful_signing_secret: String,
    pub slack_signing_secret: String,
    pub slack: Arc<dyn SlackApi>,
    pub contentful: Arc<dyn ContentfulApi>,
    pub auth_tokens: Arc<AuthTokenRepository>,
    pub events: EventsService,
}

impl AppState {
    pub fn new(
        config: Config,
        contentful_signing_secret: String,
        slack_signing_secret: String,
        slack: Arc<dyn SlackApi>,
        contentful: Arc<dyn ContentfulApi>,
        table: SingleTableClient,
        encryption: Encryption,
    ) -> AppState {
        let auth_tokens = Arc::new(AuthTokenRepository::new(table, slack.clone(), contentful.clone(), encryption));
        let events = EventsService::new(contentful.clone(), slack.clone(), auth_tokens.clone());

        AppState { config, contentful_signing_secret, slack_signing_secret, slack, contentful, auth_tokens, events }
    }

    pub async fn from_env() -> Result<AppState, AppError> {
        let config = Config::from_env()?;
        let aws_config = ::aws_config::load_defaults(BehaviorVersion::latest()).await;
        let secrets = SecretsClient::new(&aws_config).get_secret(&config.secret_name).await?;
        let http_client = build_http_client()?;

        let slack = Arc::new(Slack::new(
            http_client.clone(),
            config.slack_api_base_url.clone(),
            secrets.slack_client_id.clone(),
            secrets.slack_client_secret.clone(),
            config.oauth_redirect_url.clone(),
        ));
        let contentful = Arc::new(Contentful::new(http_client, secrets.contentful_access_token.clone(), config.app_definition_id.clone()));
        let table = SingleTableClient::dynamodb(&aws_config, config.auth_tokens_table_name.clone());
        let encryption = Encryption::with(&secrets.encryption_key)?;

        Ok(AppState::new(config, secrets.contentful_signing_secret, secrets.slack_signing_secret, slack, contentful, table, encryption))
    }

    pub fn host(&self) -> &str {
        &self.config.contentful_api_host
    }
}

#[derive(Debug, PartialEq)]
enum Route {
    OAuth,
    Tokens,
    Events,
    Messages,
    SlackEvents,
    Workspace { space_id: String, environment_id: String, workspace_id: String },
    Channels { space_id: String, environment_id: String, workspace_id: String },
    Channel { space_id: String, environment_id: String, workspace_id: String, channel_id: String },
}

impl Route {
    fn requires_contentful_signature(&self) -> bool {
        !matches!(self, Route::OAuth | Route::SlackEvents)
    }
}

fn match_route(method: &Method, path: &str) -> Option<Route> {
    lazy_static! {
        static ref WORKSPACE_PATH: Regex = Regex::new(
            r"^/api/spaces/(?P<space>[^/]+)/environments/(?P<environment>[^/]+)/workspaces/(?P<workspace>[^/]+)(?:/channels|/channel/(?P<channel>[^/]+))?/?$"
        ).unwrap();
    }

    let path = path.trim_end_matches('/');
    match (method.as_str(), path) {
        ("GET", "/api/oauth") => return Some(Route::OAuth),
        ("POST", "/api/tokens") => return Some(Route::Tokens),
        ("POST", "/api/events") => return Some(Route::Events),
        ("POST", "/api/messages") => return Some(Route::Messages),
        ("POST", "/api/slack/events") => return Some(Route::SlackEvents),
        _ => {}
    }

    if method != Method::GET {
        return None;
    }

    let captures = WORKSPACE_PATH.captures(path)?;
    let space_id = captures.name("space")?.as_str().to_string();
    let environment_id = captures.name("environment")?.as_str().to_string();
    let workspace_id = captures.name("workspace")?.as_str().to_string();

    Some(match captures.name("channel") {
        Some(channel) => Route::Channel { space_id, environment_id, workspace_id, channel_id: channel.as_str().to_string() },
        None if path.ends_with("/channels") => Route::Channels { space_id, environment_id, workspace_id },
        None => Route::Workspace { space_id, environment_id, workspace_id },
    })
}

pub fn response(status_code: i64, content_type: &str, body: String) -> ApiGatewayProxyResponse {
    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response_headers.insert("content-type", value);
    }

    ApiGatewayProxyResponse {
        status_code,
        headers: response_headers,
        body: Some(Body::from(body)),
        ..Default::default()
    }
}

pub fn json_response(status_code: i64, body: &Value) -> ApiGatewayProxyResponse {
    response(status_code, "application/json", body.to_string())
}

pub fn no_content() -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
        status_code: 204,
        ..Default::default()
    }
}

pub fn error_response(err: &AppError) -> ApiGatewayProxyResponse {
    if err.status_code() >= 500 {
        error!(error = ?err, "Request failed");
    } else {
        warn!(error = %err, status = err.status_code(), "Request rejected");
    }

    json_response(err.status_code(), &err.to_body())
}

pub(crate) fn header<'a>(request: &'a ApiGatewayProxyRequest, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn request_body(request: &ApiGatewayProxyRequest) -> Result<String, AppError> {
    let body = request.body.clone().unwrap_or_default();

    if request.is_base64_encoded {
        let decoded = base64::decode_with_pad(body.as_bytes())?;
        return String::from_utf8(decoded).map_err(|_| AppError::UnexpectedError("Request body is not UTF-8".to_string()));
    }

    Ok(body)
}

pub(crate) fn parse_json<T>(body: &str) -> Result<T, AppError>
where
    T: for<'a> serde::Deserialize<'a>,
{
    serde_json::from_str(body).map_err(|err| AppError::UnprocessableEntity {
        message: "Invalid request body".to_string(),
        details: vec![serde_json::json!({ "message": err.to_string() })],
    })
}

/// Installation context taken from the Contentful request headers.
pub(crate) fn header_context(state: &AppState, request: &ApiGatewayProxyRequest) -> Result<InstallationContext, AppError> {
    let space_id = header(request, SPACE_ID_HEADER).ok_or_else(|| AppError::not_found("Missing space id"))?;
    let environment_id = header(request, ENVIRONMENT_ID_HEADER).ok_or_else(|| AppError::not_found("Missing environment id"))?;

    Ok(InstallationContext {
        space_id: space_id.to_string(),
        environment_id: environment_id.to_string(),
        host: state.host().to_string(),
    })
}

async fn dispatch(state: &AppState, route: Route, request: &ApiGatewayProxyRequest, body: &str) -> Result<ApiGatewayProxyResponse, AppError> {
    match route {
        Route::OAuth => Ok(oauth::handle_oauth(state, &request.query_string_parameters).await),
        Route::Tokens => tokens::handle_create_token(state, request, body).await,
        Route::Events => events::handle_event(state, request, body).await,
        Route::Messages => messages::handle_post_message(state, request, body).await,
        Route::SlackEvents => slack_events::handle_slack_event(state, request, body).await,
        Route::Workspace { space_id, environment_id, workspace_id } => {
            workspaces::handle_get_workspace(state, &space_id, &environment_id, &workspace_id).await
        }
        Route::Channels { space_id, environment_id, workspace_id } => {
            workspaces::handle_list_channels(state, &space_id, &environment_id, &workspace_id).await
        }
        Route::Channel { space_id, environment_id, workspace_id, channel_id } => {
            workspaces::handle_get_channel(state, &space_id, &environment_id, &workspace_id, &channel_id).await
        }
    }
}

/// Routes one API Gateway request. Failures are rendered as `{status, message, details?}` bodies.
pub async fn handle_request(state: &AppState, request: ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
    let path = request.path.clone().unwrap_or_default();
    info!(method = %request.http_method, path = %path, "Received request");

    let Some(route) = match_route(&request.http_method, &path) else {
        return error_response(&AppError::not_found("Not found"));
    };

    let body = match request_body(&request) {
        Ok(body) => body,
        Err(err) => return error_response(&err),
    };

    if route.requires_contentful_signature() {
        if let Err(err) = verify_contentful_request(&state.contentful_signing_secret, request.http_method.as_str(), &path, &request.headers, &body, now_millis()) {
            return error_response(&err);
        }
    }

    match dispatch(state, route, &request, &body).await {
        Ok(response) => response,
        Err(err) => error_response(&err),
    }
}
