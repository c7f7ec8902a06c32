mod client;
mod download;

pub use client::{build_client, parse_http_date, USER_AGENT};
pub use download::{download_to_file, download_to_string, head_last_modified, Fetched};
