/*
 *  client.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  HTTP client for the noise sensor `/data` endpoint
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, Error as ReqwestError, StatusCode, Url};
use serde_json::Error as SerdeJsonError;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::reading::SensorPayload;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";
const DATA_PATH: &str = "data";

/// Custom error type for SensorClient operations.
#[derive(Debug)]
pub enum SensorClientError {
    /// Error building the client or during the request (network, timeout).
    HttpRequestError(ReqwestError),
    /// Non-2xx, non-404 answer from the sensor endpoint.
    HttpStatus(u16),
    /// Body was not the expected JSON.
    DeserializationError(SerdeJsonError),
    /// Base URL could not be turned into the data endpoint.
    InvalidUrl(String),
}

impl Display for SensorClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SensorClientError::HttpRequestError(e) => write!(f, "HTTP request error: {}", e),
            SensorClientError::HttpStatus(code) => write!(f, "HTTP error! status: {}", code),
            SensorClientError::DeserializationError(e) => write!(f, "JSON deserialization error: {}", e),
            SensorClientError::InvalidUrl(url) => write!(f, "Invalid sensor URL: {}", url),
        }
    }
}

impl std::error::Error for SensorClientError {}

impl From<ReqwestError> for SensorClientError {
    fn from(err: ReqwestError) -> Self {
        SensorClientError::HttpRequestError(err)
    }
}

impl From<SerdeJsonError> for SensorClientError {
    fn from(err: SerdeJsonError) -> Self {
        SensorClientError::DeserializationError(err)
    }
}

/// Result of one successful round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Payload(SensorPayload),
    /// 404, the sensor has not produced a sample yet.
    NoData,
}

/// Anything the poller can pull readings from.
#[async_trait]
pub trait ReadingSource: Send {
    async fn fetch(&mut self) -> Result<FetchOutcome, SensorClientError>;
}

/// Maps a status/body pair onto a fetch outcome.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<FetchOutcome, SensorClientError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(FetchOutcome::NoData);
    }
    if !status.is_success() {
        return Err(SensorClientError::HttpStatus(status.as_u16()));
    }
    let payload: SensorPayload = serde_json::from_str(body)?;
    Ok(FetchOutcome::Payload(payload))
}

/// Builds `{base}/data`, tolerating a trailing slash on the base.
pub fn data_url(base_url: &str) -> Result<Url, SensorClientError> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
        .and_then(|u| u.join(DATA_PATH))
        .map_err(|_| SensorClientError::InvalidUrl(base_url.to_string()))
}

/// A client for the noise sensor endpoint.
#[derive(Debug)]
pub struct SensorClient {
    url: Url,
    client: Client,
}

impl SensorClient {
    /// Creates a new `SensorClient` with populated headers and timeouts.
    pub fn new(base_url: &str, connect_timeout: Duration, timeout: Duration) -> Result<Self, SensorClientError> {
        const VERSION: &str = concat!("NoiseMon ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(SensorClient { url: data_url(base_url)?, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the latest reading.
    pub async fn get_latest(&self) -> Result<FetchOutcome, SensorClientError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("GET {} -> {} ({} bytes)", self.url, status, body.len());
        interpret_response(status, &body)
    }
}

#[async_trait]
impl ReadingSource for SensorClient {
    async fn fetch(&mut self) -> Result<FetchOutcome, SensorClientError> {
        self.get_latest().await
    }
}
