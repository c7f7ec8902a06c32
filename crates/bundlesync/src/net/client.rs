use crate::errors::Result;
use chrono::DateTime;
use reqwest::blocking::Client;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("bundlesync/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTPS client with rustls. Caller runs it off the coordination thread.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// `Last-Modified` header value to milliseconds since epoch; `0` if unparsable.
pub fn parse_http_date(value: Option<&str>) -> i64 {
    value
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
        .map(|d| d.timestamp_millis())
        .unwrap_or(0)
}
