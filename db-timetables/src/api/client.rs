//! Timetables HTTP client.
//!
//! Thin reqwest adapter over the DB API Marketplace Timetables endpoints.
//! Handles authentication headers, status mapping and XML decoding; the
//! loader owns all caching and cadence decisions.

use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::domain::{EvaNumber, TimetableStop};

use super::TimetableApi;
use super::convert::convert_timetable;
use super::error::TimetableError;
use super::types::TimetableDto;

/// Default base URL for the Timetables API.
const DEFAULT_BASE_URL: &str = "https://apis.deutschebahn.com/db-api-marketplace/apis/timetables/v1";

/// Configuration for the Timetables client.
#[derive(Debug, Clone)]
pub struct TimetablesConfig {
    /// Client id for the DB-Client-Id header
    pub client_id: String,
    /// API key for the DB-Api-Key header
    pub api_key: String,
    /// Base URL for the API (defaults to the DB API Marketplace)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TimetablesConfig {
    /// Create a new config with the given credentials.
    pub fn new(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP client for the DB Timetables API.
#[derive(Debug, Clone)]
pub struct TimetablesClient {
    http: reqwest::Client,
    base_url: String,
}

impl TimetablesClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TimetablesConfig) -> Result<Self, TimetableError> {
        let mut headers = HeaderMap::new();

        let client_id =
            HeaderValue::from_str(&config.client_id).map_err(|_| TimetableError::Api {
                status: 0,
                message: "Invalid client id format".to_string(),
            })?;
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| TimetableError::Api {
            status: 0,
            message: "Invalid API key format".to_string(),
        })?;
        headers.insert(HeaderName::from_static("db-client-id"), client_id);
        headers.insert(HeaderName::from_static("db-api-key"), api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Fetch one endpoint and decode the `<timetable>` body.
    async fn fetch_timetable(&self, url: &str) -> Result<Vec<TimetableStop>, TimetableError> {
        debug!(url, "fetching timetable");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TimetableError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TimetableError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TimetableError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let timetable: TimetableDto =
            quick_xml::de::from_str(&body).map_err(|e| TimetableError::Xml {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        Ok(convert_timetable(&timetable))
    }
}

impl TimetableApi for TimetablesClient {
    async fn get_plan(
        &self,
        station: EvaNumber,
        hour: NaiveDateTime,
    ) -> Result<Vec<TimetableStop>, TimetableError> {
        let url = format!(
            "{}/plan/{}/{}/{}",
            self.base_url,
            station,
            hour.format("%y%m%d"),
            hour.format("%H"),
        );
        self.fetch_timetable(&url).await
    }

    async fn get_full_changes(
        &self,
        station: EvaNumber,
    ) -> Result<Vec<TimetableStop>, TimetableError> {
        let url = format!("{}/fchg/{}", self.base_url, station);
        self.fetch_timetable(&url).await
    }

    async fn get_recent_changes(
        &self,
        station: EvaNumber,
    ) -> Result<Vec<TimetableStop>, TimetableError> {
        let url = format!("{}/rchg/{}", self.base_url, station);
        self.fetch_timetable(&url).await
    }
}
