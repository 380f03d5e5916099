//! Client for the streaming `/api/ai/generate` endpoint.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use scribe_sync::{ByteStream, RemoteFailure, StreamError, StreamTransport};
use scribe_types::{GenerateRequest, StreamAction};
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{self, transport};

#[derive(Clone)]
pub struct AiClient {
    http: Client,
    config: ClientConfig,
}

impl AiClient {
    pub fn new(config: ClientConfig) -> Result<Self, RemoteFailure> {
        Ok(Self {
            http: http::build_client()?,
            config,
        })
    }
}

#[async_trait]
impl StreamTransport for AiClient {
    // No timeout: the body arrives over as long as generation takes.
    async fn open(&self, action: StreamAction, text: &str) -> Result<ByteStream, StreamError> {
        let body = GenerateRequest {
            text: text.to_string(),
            action,
        };
        let response = self
            .http
            .post(self.config.endpoint("/api/ai/generate"))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let response = http::check(response).await?;
        debug!(%action, status = %response.status(), "generation stream opened");

        Ok(response
            .bytes_stream()
            .map_err(|e| StreamError::Interrupted(e.to_string()))
            .boxed())
    }
}
