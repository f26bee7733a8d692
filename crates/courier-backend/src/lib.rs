//! Uniform adapters over the hosted generative backends.
//!
//! Each backend advertises a subset of the capability set
//! {generate-text, generate-image, describe-image} through the
//! `BackendAdapter` trait. Backends are stateless with respect to the core:
//! all conversational memory is supplied explicitly per call, which keeps
//! mid-conversation backend switching correct.

pub mod adapter;
pub mod chat_completion;
pub mod error;
pub mod image_gen;
pub mod vision;
mod wire;

pub use adapter::{BackendAdapter, BackendRegistry};
pub use chat_completion::ChatCompletionAdapter;
pub use error::BackendError;
pub use image_gen::ImageGenAdapter;
pub use vision::VisionAdapter;
