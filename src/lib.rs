pub mod auth_tokens;
pub mod base64;
pub mod config;
pub mod db;
pub mod encryption;
pub mod errors;
pub mod events;
pub mod handlers;
mod http_client;
pub mod logging;
pub mod secrets;
pub mod service_provider;
pub mod signature;
pub mod timestamp;

#[cfg(test)]
mod testing;

pub use http_client::build_http_client;
