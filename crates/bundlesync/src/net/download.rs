use crate::errors::{BundleError, Result};
use crate::progress::{format_size, CancelFlag, Progress};
use reqwest::blocking::{Client, Response};
use reqwest::header::LAST_MODIFIED;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// A downloaded body plus its `Last-Modified` header.
#[derive(Debug)]
pub struct Fetched<T> {
    pub body: T,
    pub last_modified: Option<String>,
}

fn check_status(url: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(BundleError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

fn last_modified(resp: &Response) -> Option<String> {
    resp.headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// HEAD request; returns the `Last-Modified` header if the server sent one.
pub fn head_last_modified(client: &Client, url: &str) -> Result<Option<String>> {
    debug!("HEAD {url}");
    let resp = check_status(url, client.head(url).send()?)?;
    Ok(last_modified(&resp))
}

/// GET a small text body.
pub fn download_to_string(client: &Client, url: &str) -> Result<Fetched<String>> {
    debug!("GET {url}");
    let resp = check_status(url, client.get(url).send()?)?;
    let last_modified = last_modified(&resp);
    let body = resp.text()?;
    Ok(Fetched {
        body,
        last_modified,
    })
}

/// Stream a GET body into `dest`, reporting bytes and honoring `cancel`
/// between chunks. Returns the number of bytes written.
pub fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    progress: &dyn Progress,
    cancel: &CancelFlag,
) -> Result<u64> {
    debug!("GET {url} -> {}", dest.display());
    let mut resp = check_status(url, client.get(url).send()?)?;
    let total = resp.content_length();
    progress.set_text(&format!("Downloading bundle ({})", format_size(total)));
    if let Some(name) = url.rsplit('/').next().filter(|n| !n.is_empty()) {
        progress.set_detail(&format!("Downloading {name}"));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = fs::File::create(dest)?;
    let mut buf = [0u8; 128 * 1024];
    let mut done = 0u64;

    loop {
        cancel.check()?;
        let n = resp.read(&mut buf).map_err(|source| BundleError::Transfer {
            url: url.to_string(),
            source,
        })?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        done += n as u64;
        progress.set_bytes(done, total);
    }
    out.flush()?;

    Ok(done)
}
