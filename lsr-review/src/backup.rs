//! Remote backup of the annotation file
//!
//! `PUT <base_url>/<namespace>/<file_name>` with basic auth. Only 200, 201
//! and 204 count as success. The local annotation file stays the durable
//! record whatever the outcome.

use chrono::{DateTime, Utc};
use lsr_common::config::BackupConfig;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lsr-review/", env!("CARGO_PKG_VERSION"));

/// Backup errors
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup credentials not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed upload: {status}, {body}")]
    Rejected { status: u16, body: String },
}

/// Successful upload
#[derive(Debug, Clone, Serialize)]
pub struct BackupReceipt {
    pub remote_path: String,
    pub status: u16,
    pub bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Upload statuses counted as stored: OK, Created, No Content
pub fn is_accepted(status: u16) -> bool {
    matches!(status, 200 | 201 | 204)
}

/// WebDAV-style uploader
pub struct BackupClient {
    http_client: reqwest::Client,
    config: BackupConfig,
}

impl BackupClient {
    pub fn new(config: BackupConfig) -> Result<Self, BackupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// `<namespace>/<file_name>`
    pub fn remote_path(&self, file_name: &str) -> String {
        let namespace = self.config.namespace.trim_matches('/');
        if namespace.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", namespace, file_name)
        }
    }

    pub fn url(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.remote_path(file_name)
        )
    }

    pub async fn upload(&self, file_name: &str, body: Vec<u8>) -> Result<BackupReceipt, BackupError> {
        let (username, password) = match (&self.config.username, &self.config.password) {
            (Some(u), Some(p)) if self.config.has_credentials() => (u.clone(), p.clone()),
            _ => return Err(BackupError::NotConfigured),
        };

        let bytes = body.len();
        let response = self
            .http_client
            .put(self.url(file_name))
            .basic_auth(username, Some(password))
            .body(body)
            .send()
            .await
            .map_err(|e| BackupError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !is_accepted(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Rejected { status, body });
        }

        Ok(BackupReceipt {
            remote_path: self.remote_path(file_name),
            status,
            bytes,
            uploaded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let client = BackupClient::new(BackupConfig {
            base_url: "https://dav.example.com/dav/".to_string(),
            namespace: "/LabSafety/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.remote_path("chem_annotation.json"), "LabSafety/chem_annotation.json");
        assert_eq!(
            client.url("chem_annotation.json"),
            "https://dav.example.com/dav/LabSafety/chem_annotation.json"
        );
    }

    #[test]
    fn test_accepted_statuses() {
        for status in [200, 201, 204] {
            assert!(is_accepted(status), "{} should be accepted", status);
        }
        for status in [202, 207, 301, 401, 403, 404, 409, 500, 507] {
            assert!(!is_accepted(status), "{} should be rejected", status);
        }
    }

    #[test]
    fn test_rejection_reports_status_and_body() {
        let err = BackupError::Rejected {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "Failed upload: 401, Unauthorized");
    }

    /// Serve `PUT /dav/LabSafety/:file` answering with a fixed status and body
    async fn fake_dav(status: u16, body: &'static str) -> String {
        use axum::{http::StatusCode, routing::put, Router};

        let status = StatusCode::from_u16(status).unwrap();
        let app = Router::new().route("/dav/LabSafety/:file", put(move || async move { (status, body) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/dav", addr)
    }

    fn client_for(base_url: String) -> BackupClient {
        BackupClient::new(BackupConfig {
            base_url,
            username: Some("reviewer".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_created() {
        let client = client_for(fake_dav(201, "").await);
        let receipt = client.upload("chem_annotation.json", b"[]".to_vec()).await.unwrap();
        assert_eq!(receipt.status, 201);
        assert_eq!(receipt.bytes, 2);
        assert_eq!(receipt.remote_path, "LabSafety/chem_annotation.json");
    }

    #[tokio::test]
    async fn test_upload_multi_status_is_rejected() {
        let client = client_for(fake_dav(207, "partial").await);
        let err = client.upload("chem_annotation.json", b"[]".to_vec()).await.unwrap_err();
        match err {
            BackupError::Rejected { status, body } => {
                assert_eq!(status, 207);
                assert_eq!(body, "partial");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_without_credentials() {
        let client = BackupClient::new(BackupConfig::default()).unwrap();
        let err = client.upload("x.json", b"[]".to_vec()).await.unwrap_err();
        assert!(matches!(err, BackupError::NotConfigured));
    }
}
