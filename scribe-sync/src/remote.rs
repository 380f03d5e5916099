//! Boundaries to the remote store and the generation endpoint.
//!
//! The engine only talks to these traits; `scribe-client` provides the HTTP
//! implementations and tests provide scripted ones.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use scribe_types::{DraftHandle, PostId, PostUpdate, StreamAction};

use crate::error::{CreateError, StreamError, UpdateError};

/// Response body of a generation request, delivered chunk by chunk without
/// buffering. Chunk boundaries carry no meaning and may split characters.
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create an empty draft with the given title.
    async fn create(&self, title: &str) -> Result<DraftHandle, CreateError>;

    /// Replace the stored post with `update`. Safe to repeat with newer state.
    async fn update(&self, id: &PostId, update: &PostUpdate) -> Result<(), UpdateError>;
}

#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Start generating `action` over `text`. Resolves once the response
    /// headers arrive; the body is read through the returned stream.
    async fn open(&self, action: StreamAction, text: &str) -> Result<ByteStream, StreamError>;
}
