mod auth_token_repository;

#[cfg(test)]
mod auth_token_repository_test;

pub use auth_token_repository::{AuthTokenRepository, InstallationContext, ValidatedGrant, EXPIRY_GRACE_MILLIS, INVALID_REFRESH_TOKEN};
