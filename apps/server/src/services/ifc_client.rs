//! Client for the external IFC parsing service.
//!
//! The service receives the raw IFC file and answers with the parsed element
//! list. Only the response shape is relied upon.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ParsedElement, ParsedModel};

/// HTTP connect timeout for the parsing service.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the original file name.
pub const FILENAME_HEADER: &str = "X-Filename";

/// Converts an IFC file into parsed elements.
#[async_trait]
pub trait IfcParser: Send + Sync {
    async fn parse(&self, filename: &str, bytes: Vec<u8>) -> AppResult<Vec<ParsedElement>>;
}

/// [`IfcParser`] backed by `POST {base_url}/parse`.
#[derive(Clone)]
pub struct HttpIfcParser {
    parse_url: String,
    http_client: reqwest::Client,
}

impl HttpIfcParser {
    pub fn new(base_url: &str, request_timeout: Duration) -> AppResult<Self> {
        let parse_url = format!("{}/parse", base_url.trim_end_matches('/'));

        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            parse_url,
            http_client,
        })
    }
}

#[async_trait]
impl IfcParser for HttpIfcParser {
    async fn parse(&self, filename: &str, bytes: Vec<u8>) -> AppResult<Vec<ParsedElement>> {
        info!(
            filename = %filename,
            size = bytes.len(),
            "Sending IFC file to parsing service"
        );

        let response = self
            .http_client
            .post(&self.parse_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(FILENAME_HEADER, filename)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Parsing service rejected file");
            return Err(AppError::Upstream(format!(
                "Parsing service returned {}",
                status
            )));
        }

        let parsed: ParsedModel = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid parsing service response: {}", e)))?;

        info!(elements = parsed.elements.len(), "IFC file parsed");
        Ok(parsed.elements)
    }
}
