//! Client for the `/api/posts` resource.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use scribe_sync::{CreateError, PersistenceClient, RemoteFailure, UpdateError};
use scribe_types::{DraftHandle, Post, PostCreate, PostId, PostSummary, PostUpdate};
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{self, transport};

#[derive(Clone)]
pub struct PostsClient {
    http: Client,
    config: ClientConfig,
}

impl PostsClient {
    pub fn new(config: ClientConfig) -> Result<Self, RemoteFailure> {
        Ok(Self {
            http: http::build_client()?,
            config,
        })
    }

    fn with_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    fn post_url(&self, id: &PostId) -> String {
        self.config.endpoint(&format!("/api/posts/{id}"))
    }

    /// All posts, most recently updated first.
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>, RemoteFailure> {
        let request = self.http.get(self.config.endpoint("/api/posts/"));
        let response = self.with_timeout(request).send().await.map_err(transport)?;
        http::json(response).await
    }

    pub async fn fetch_post(&self, id: &PostId) -> Result<Post, RemoteFailure> {
        let request = self.http.get(self.post_url(id));
        let response = self.with_timeout(request).send().await.map_err(transport)?;
        http::json(response).await
    }

    pub async fn create_post(&self, body: &PostCreate) -> Result<Post, RemoteFailure> {
        let request = self.http.post(self.config.endpoint("/api/posts/")).json(body);
        let response = self.with_timeout(request).send().await.map_err(transport)?;
        let post: Post = http::json(response).await?;
        debug!(post = %post.id, title = %post.title, "post created");
        Ok(post)
    }

    /// Only the fields set in `update` are changed on the server.
    pub async fn update_post(&self, id: &PostId, update: &PostUpdate) -> Result<Post, RemoteFailure> {
        let request = self.http.patch(self.post_url(id)).json(update);
        let response = self.with_timeout(request).send().await.map_err(transport)?;
        http::json(response).await
    }

    pub async fn publish_post(&self, id: &PostId) -> Result<Post, RemoteFailure> {
        let url = self.config.endpoint(&format!("/api/posts/{id}/publish"));
        let response = self
            .with_timeout(self.http.post(url))
            .send()
            .await
            .map_err(transport)?;
        http::json(response).await
    }
}

#[async_trait]
impl PersistenceClient for PostsClient {
    async fn create(&self, title: &str) -> Result<DraftHandle, CreateError> {
        let post = self
            .create_post(&PostCreate {
                title: title.to_string(),
            })
            .await?;
        Ok(DraftHandle {
            id: post.id,
            title: post.title,
        })
    }

    async fn update(&self, id: &PostId, update: &PostUpdate) -> Result<(), UpdateError> {
        self.update_post(id, update).await?;
        Ok(())
    }
}
