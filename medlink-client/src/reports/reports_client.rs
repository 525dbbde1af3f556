use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Header the reports service reads the session token from.
pub const TOKEN_HEADER: &str = "token";

#[derive(Debug, Error)]
pub enum ReportsError {
    #[error("reports service refused the credential")]
    Unauthorized,
    #[error("reports request failed: {0}")]
    Http(String),
    #[error("reports service rejected the request: {0}")]
    Rejected(String),
    #[error("unexpected reports response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Uploader {
    Doctor,
    Patient,
}

impl Uploader {
    pub fn as_str(self) -> &'static str {
        match self {
            Uploader::Doctor => "doctor",
            Uploader::Patient => "patient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub url: String,
    pub uploaded_by: Uploader,
    pub uploaded_at: DateTime<Utc>,
}

/// A file to attach to an appointment.
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    reports: Vec<Report>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Client for the appointment reports service.
#[derive(Clone)]
pub struct ReportsClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl fmt::Debug for ReportsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportsClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ReportsClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ReportsError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ReportsError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            http,
        })
    }

    /// Reports attached to `appointment_id`, oldest first as the service lists them.
    pub async fn list(&self, appointment_id: &str) -> Result<Vec<Report>, ReportsError> {
        let url = format!("{}/api/user/get-reports/{}", self.base_url, appointment_id);
        debug!(%url, "Listing reports");

        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| ReportsError::Http(e.to_string()))?;

        let body: ListResponse = Self::decode(response).await?;
        if !body.success {
            return Err(ReportsError::Rejected(
                body.message.unwrap_or_else(|| "listing refused".to_owned()),
            ));
        }
        Ok(body.reports)
    }

    /// Uploads `file` and returns the URL it was stored under.
    pub async fn upload(
        &self,
        file: ReportFile,
        appointment_id: &str,
        uploaded_by: Uploader,
    ) -> Result<String, ReportsError> {
        let url = format!("{}/api/user/upload-report", self.base_url);
        let size = file.bytes.len();

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)
            .map_err(|e| ReportsError::Http(e.to_string()))?;
        let form = Form::new()
            .part("report", part)
            .text("appointmentId", appointment_id.to_owned())
            .text("uploadedBy", uploaded_by.as_str());

        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReportsError::Http(e.to_string()))?;

        let body: UploadResponse = Self::decode(response).await?;
        if !body.success {
            return Err(ReportsError::Rejected(
                body.message.unwrap_or_else(|| "upload refused".to_owned()),
            ));
        }
        let stored = body
            .url
            .ok_or_else(|| ReportsError::Decode("upload response has no url".to_owned()))?;
        info!(appointment = %appointment_id, size, url = %stored, "Report uploaded");
        Ok(stored)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ReportsError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ReportsError::Unauthorized);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReportsError::Http(format!("HTTP {status}: {text}")));
        }
        response
            .json()
            .await
            .map_err(|e| ReportsError::Decode(e.to_string()))
    }
}
