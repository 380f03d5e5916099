//! Client-side synchronization engine for the scribe editor.
//!
//! Keeps a locally edited document in sync with the posts API (debounced
//! auto-save, lazy draft creation, save status feedback) and ingests
//! streamed AI output into the same shared state.

pub mod autosave;
pub mod config;
pub mod debounce;
pub mod decode;
pub mod draft;
pub mod error;
pub mod remote;
pub mod session;
pub mod state;
pub mod status;
pub mod stream;

#[cfg(test)]
mod testing;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub use autosave::SaveCoordinator;
pub use config::SyncConfig;
pub use debounce::Debouncer;
pub use decode::Utf8ChunkDecoder;
pub use draft::DraftProvisioner;
pub use error::{CreateError, RemoteFailure, StreamError, UpdateError};
pub use remote::{ByteStream, PersistenceClient, StreamTransport};
pub use session::{EditorSession, EditorSurface, SurfaceContent};
pub use state::{DocumentState, EditorSnapshot, SavePayload, StateEvent, StreamEnd, StreamView};
pub use status::{SaveStatusMachine, SaveTrigger};
pub use stream::{StreamIngestor, StreamOutcome};

/// Install the global fmt subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
