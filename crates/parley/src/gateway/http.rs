//! HTTP implementation of the gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::Gateway;
use crate::error::{ClientError, Result};
use crate::model::{Identity, Message, SessionHandle};

/// Gateway implementation over the backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    /// HTTP client.
    client: Client,
    /// Base URL of the backend (e.g., "http://127.0.0.1:8000").
    base_url: String,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl HttpGateway {
    /// Create a new gateway for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Transport(format!("malformed response: {err}")))
    }
}

/// Map a non-success status to the client taxonomy, surfacing the
/// backend's `detail` reason verbatim when present.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response.text().await.ok().and_then(|body| extract_detail(&body));
    debug!(%status, ?detail, "backend returned an error");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
            ClientError::auth(detail.unwrap_or_else(|| "auth failed".to_string()))
        }
        StatusCode::NOT_FOUND => {
            ClientError::NotFound(detail.unwrap_or_else(|| "not found".to_string()))
        }
        _ => ClientError::Transport(detail.unwrap_or_else(|| format!("unexpected status {status}"))),
    })
}

/// Pull the `detail` field out of an error body, if it is one.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|detail| detail.as_str())
        .map(str::to_string)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&Credentials { username, password })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn register(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&Credentials { username, password })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionHandle>> {
        let response = self
            .client
            .get(self.url(&format!("/conversations/{user_id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_session(&self, user_id: i64) -> Result<SessionHandle> {
        let response = self
            .client
            .post(self.url(&format!("/conversations/{user_id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_session(&self, session_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/conversations/{session_id}")))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_transcript(&self, session_id: i64) -> Result<Vec<Message>> {
        let response = self
            .client
            .get(self.url(&format!("/history/{session_id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn exchange(&self, session_id: i64, text: &str) -> Result<()> {
        // The reply body is ignored; the transcript is re-fetched for
        // the authoritative result.
        let url = format!(
            "{}?user_message={}",
            self.url(&format!("/chat/{session_id}")),
            urlencoding::encode(text)
        );
        let response = self.client.post(url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
