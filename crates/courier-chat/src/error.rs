//! Error type for the routing core.

use courier_backend::BackendError;

use crate::synth::SynthesisError;
use crate::transport::TransportError;

/// Errors crossing the dispatcher boundary.
///
/// Backend and synthesis failures are caught inside the dispatcher and
/// converted to user-visible notices; what escapes `handle_event` is only
/// logged, never allowed to terminate the event loop.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
}
