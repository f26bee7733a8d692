//! Message routing core for Courier.
//!
//! The dispatcher inspects each inbound event, resolves the user's state,
//! selects a backend adapter, and packages the multi-modal response back
//! through the transport. The session gate guarantees arrival-order
//! processing per user while letting independent users proceed
//! concurrently.

pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod menu;
pub mod render;
pub mod synth;
pub mod testing;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::ChatError;
pub use gate::SessionGate;
pub use menu::{MenuKind, MenuOutcome, MenuStateMachine};
pub use render::{RenderedChunk, ResponseRenderer};
pub use synth::{DisabledSynthesizer, SpeechSynthesizer, SynthesisError};
pub use transport::{ChatTransport, TransportError};
