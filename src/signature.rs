use aws_lambda_events::http::HeaderMap;
use ring::hmac;
use tracing::warn;

use crate::errors::AppError;

pub const CONTENTFUL_SIGNATURE: &str = "x-contentful-signature";
pub const CONTENTFUL_SIGNED_HEADERS: &str = "x-contentful-signed-headers";
pub const CONTENTFUL_TIMESTAMP: &str = "x-contentful-timestamp";
pub const CONTENTFUL_REQUEST_TTL_MILLIS: i64 = 30_000;

pub const SLACK_SIGNATURE: &str = "x-slack-signature";
pub const SLACK_REQUEST_TIMESTAMP: &str = "x-slack-request-timestamp";
pub const SLACK_REQUEST_TTL_SECONDS: i64 = 60 * 5;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn verification_failed(reason: &str) -> AppError {
    warn!(reason, "Request verification failed");
    // Deliberately vague, callers must not learn which check failed.
    AppError::not_found("Not found")
}

fn canonical_contentful_request(method: &str, path: &str, signed_headers: &[(String, String)], body: &str) -> String {
    let headers = signed_headers.iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join(";");

    format!("{}\n{}\n{}\n{}", method.to_uppercase(), path, headers, body)
}

fn collect_signed_headers(headers: &HeaderMap, names: &str) -> Option<Vec<(String, String)>> {
    let mut signed: Vec<(String, String)> = names.split(',')
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .map(|name| header(headers, &name).map(|value| (name.clone(), value.trim().to_string())))
        .collect::<Option<_>>()?;

    signed.sort();
    Some(signed)
}

/// Signs a request the way Contentful signs app requests. `headers` must already hold the signed headers.
#[cfg(test)]
pub fn sign_contentful_request(secret: &str, method: &str, path: &str, headers: &HeaderMap, body: &str) -> Option<String> {
    let names = header(headers, CONTENTFUL_SIGNED_HEADERS)?;
    let signed_headers = collect_signed_headers(headers, names)?;
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());

    let canonical = canonical_contentful_request(method, path, &signed_headers, body);
    Some(hex::encode(hmac::sign(&key, canonical.as_bytes()).as_ref()))
}

pub fn verify_contentful_request(secret: &str, method: &str, path: &str, headers: &HeaderMap, body: &str, now_millis: i64) -> Result<(), AppError> {
    let signature = header(headers, CONTENTFUL_SIGNATURE).ok_or_else(|| verification_failed("missing signature"))?;
    let names = header(headers, CONTENTFUL_SIGNED_HEADERS).ok_or_else(|| verification_failed("missing signed headers"))?;
    let timestamp = header(headers, CONTENTFUL_TIMESTAMP)
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| verification_failed("missing timestamp"))?;

    if !names.split(',').any(|name| name.trim().eq_ignore_ascii_case(CONTENTFUL_TIMESTAMP)) {
        return Err(verification_failed("timestamp is not signed"));
    }
    if now_millis - timestamp > CONTENTFUL_REQUEST_TTL_MILLIS {
        return Err(verification_failed("request expired"));
    }

    let signed_headers = collect_signed_headers(headers, names).ok_or_else(|| verification_failed("signed header missing"))?;
    let expected = hex::decode(signature).map_err(|_| verification_failed("malformed signature"))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let canonical = canonical_contentful_request(method, path, &signed_headers, body);

    hmac::verify(&key, canonical.as_bytes(), &expected).map_err(|_| verification_failed("signature mismatch"))
}

#[cfg(test)]
pub fn sign_slack_request(secret: &str, timestamp: i64, body: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let sig_basestring = format!("v0:{}:{}", timestamp, body);

    format!("v0={}", hex::encode(hmac::sign(&key, sig_basestring.as_bytes()).as_ref()))
}

pub fn verify_slack_request(secret: &str, headers: &HeaderMap, body: &str, now_seconds: i64) -> Result<(), AppError> {
    let timestamp = header(headers, SLACK_REQUEST_TIMESTAMP)
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| verification_failed("missing slack timestamp"))?;
    let signature = header(headers, SLACK_SIGNATURE).ok_or_else(|| verification_failed("missing slack signature"))?;

    if (now_seconds - timestamp).abs() > SLACK_REQUEST_TTL_SECONDS {
        return Err(verification_failed("invalid slack timestamp"));
    }

    let expected = signature.strip_prefix("v0=")
        .and_then(|hex_signature| hex::decode(hex_signature).ok())
        .ok_or_else(|| verification_failed("malformed slack signature"))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let sig_basestring = format!("v0:{}:{}", timestamp, body);

    hmac::verify(&key, sig_basestring.as_bytes(), &expected).map_err(|_| verification_failed("slack signature mismatch"))
}
