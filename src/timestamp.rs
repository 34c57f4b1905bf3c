use chrono::{DateTime, TimeZone, Utc};

pub fn get_current_timestamp_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the unix epoch, the unit token expiry is stored in.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
