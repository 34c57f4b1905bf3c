use std::env::VarError;

use aws_sdk_dynamodb::{operation::{put_item::PutItemError, get_item::GetItemError, delete_item::DeleteItemError, query::QueryError}, error::SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use lambda_runtime::Diagnostic;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    UnprocessableEntity { message: String, details: Vec<Value> },

    #[error("{message}")]
    Conflict { message: String, details: Option<Value> },

    #[error("{0}")]
    OAuthProviderError(String),

    #[error("Slack error: `{0:?}`")]
    SlackError(String),

    #[error("Contentful error: `{0:?}`")]
    ContentfulError(String),

    #[error("Invalid container pointer segment: `{0:?}`")]
    InvalidPointerSegment(String),

    #[error("Missing or malformed attribute `{0}` in stored record")]
    InvalidRecord(String),

    #[error("Failed to decode base64, `{0:?}`")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("Failed to parse json: `{0:?}`")]
    JsonError(#[from] serde_json::Error),

    #[error("Reqwest error")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Failed to get secret value: `{0:?}`")]
    GetSecretValueError(#[from] SdkError<GetSecretValueError>),

    #[error("Failed to put item to DynamoDB: `{0:?}`")]
    DynamoDBPutItemError(#[from] SdkError<PutItemError>),

    #[error("Failed to get item from DynamoDB: `{0:?}`")]
    DynamoDBGetItemError(#[from] SdkError<GetItemError>),

    #[error("Failed to delete item from DynamoDB: `{0:?}`")]
    DynamoDBDeleteItemError(#[from] SdkError<DeleteItemError>),

    #[error("Failed to query DynamoDB index: `{0:?}`")]
    DynamoDBQueryError(#[from] SdkError<QueryError>),

    #[error("Failed to encrypt/decrypt: `{0:?}`")]
    Chacha20poly1305Error(#[from] chacha20poly1305::Error),

    #[error("Failed to load enviroment variable: `{0:?}`")]
    VarError(#[from] VarError),

    #[error("Unexpected error: `{0:?}`")]
    UnexpectedError(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> AppError {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> AppError {
        AppError::Conflict { message: message.into(), details: None }
    }

    pub fn status_code(&self) -> i64 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::UnprocessableEntity { .. } => 422,
            AppError::Conflict { .. } | AppError::OAuthProviderError(_) => 409,
            _ => 500,
        }
    }

    /// Body returned to HTTP callers. Untyped failures never leak their message.
    pub fn to_body(&self) -> Value {
        match self {
            AppError::UnprocessableEntity { message, details } => json!({
                "status": 422,
                "message": message,
                "details": details,
            }),
            AppError::Conflict { message, details: Some(details) } => json!({
                "status": 409,
                "message": message,
                "details": details,
            }),
            AppError::NotFound(_) | AppError::Conflict { .. } | AppError::OAuthProviderError(_) => json!({
                "status": self.status_code(),
                "message": self.to_string(),
            }),
            _ => json!({
                "status": 500,
                "message": "Internal Server Error",
            }),
        }
    }
}

// required by Lambda Runtime crate
impl From<AppError> for Diagnostic {
    fn from(error: AppError) -> Diagnostic {
        Diagnostic {
            error_type: format!("{:?}", error),
            error_message: error.to_string(),
        }
    }
}
