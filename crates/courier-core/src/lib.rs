pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::CourierConfig;
pub use error::{CourierError, Result};
pub use events::{Command, EventKind, InboundEvent, MenuOption, OutboundMessage};
pub use types::*;
