//! Retrieve schema text from a location URI.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;
use url::Url;

use crate::error::{Result, SchemaError};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parse a schema location into a URL.
pub fn parse_location(location: &str) -> Result<Url> {
    Url::parse(location.trim()).map_err(|e| SchemaError::InvalidLocation {
        location: location.to_string(),
        reason: e.to_string(),
    })
}

/// Fetch schema text over HTTP(S), or read it for a `file:` URL.
pub fn fetch_schema(url: &Url) -> Result<String> {
    match url.scheme() {
        "file" => {
            let path = url.to_file_path().map_err(|()| SchemaError::InvalidLocation {
                location: url.to_string(),
                reason: "not a local file path".to_string(),
            })?;
            debug!("Reading schema from {}", path.display());
            std::fs::read_to_string(&path).map_err(|e| SchemaError::io("read", path, e))
        }
        "http" | "https" => fetch_remote(url),
        other => Err(SchemaError::InvalidLocation {
            location: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn fetch_remote(url: &Url) -> Result<String> {
    let network = |source| SchemaError::Network {
        location: url.to_string(),
        source,
    };
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(network)?;

    debug!(%url, "Fetching schema");
    let response = client
        .get(url.as_str())
        .header(USER_AGENT, concat!("tdd2rm/", env!("CARGO_PKG_VERSION")))
        .send()
        .map_err(network)?;

    if !response.status().is_success() {
        return Err(SchemaError::HttpStatus {
            location: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    response.text().map_err(network)
}
