use std::env;

use crate::errors::AppError;

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_CONTENTFUL_API_HOST: &str = "api.contentful.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub env: String,
    pub secret_name: String,
    pub auth_tokens_table_name: String,

    pub frontend_url: String,
    pub oauth_redirect_url: String,
    pub app_definition_id: String,
    pub slack_api_base_url: String,
    pub contentful_api_host: String,
}

impl Config {
    pub fn new(env: &str) -> Config {
        Config {
            env: env.to_string(),
            secret_name: format!("contentful-slack-notifier/{}/secrets", env),
            auth_tokens_table_name: format!("contentful-slack-auth-tokens-{}", env),

            frontend_url: String::new(),
            oauth_redirect_url: String::new(),
            app_definition_id: String::new(),
            slack_api_base_url: DEFAULT_SLACK_API_BASE_URL.to_string(),
            contentful_api_host: DEFAULT_CONTENTFUL_API_HOST.to_string(),
        }
    }

    pub fn from_env() -> Result<Config, AppError> {
        let env_name = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
        let mut config = Config::new(&env_name);

        config.frontend_url = env::var("FRONTEND_URL")?;
        config.oauth_redirect_url = env::var("OAUTH_REDIRECT_URL")?;
        config.app_definition_id = env::var("CONTENTFUL_APP_DEFINITION_ID")?;

        if let Ok(base_url) = env::var("SLACK_API_BASE_URL") {
            config.slack_api_base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(host) = env::var("CONTENTFUL_API_HOST") {
            config.contentful_api_host = host;
        }
        if let Ok(table_name) = env::var("AUTH_TOKENS_TABLE") {
            config.auth_tokens_table_name = table_name;
        }

        Ok(config)
    }
}
