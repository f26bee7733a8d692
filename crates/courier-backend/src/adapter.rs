//! Backend adapter trait and registry.
//!
//! Defines the `BackendAdapter` async trait covering the full capability
//! set, and the registry the dispatcher resolves backends from. Adding a
//! backend means adding one adapter and registering it, never editing the
//! router.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::types::{BackendKind, Capability, ImageArtifact, Turn};

use crate::error::BackendError;

/// Uniform interface to one hosted generative backend.
///
/// Each concrete backend implements the subset of capabilities it
/// advertises through `supports`. The default method bodies return
/// `Unsupported`; callers must check `supports` first, so hitting a default
/// body is a programming error on the caller's side, not a backend fault.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Which registry slot this backend occupies.
    fn kind(&self) -> BackendKind;

    /// Whether the backend advertises a capability.
    fn supports(&self, capability: Capability) -> bool;

    /// Generate a text reply from the full conversational context, in
    /// insertion order.
    async fn generate_text(&self, _context: &[Turn]) -> Result<String, BackendError> {
        Err(BackendError::Unsupported {
            backend: self.name(),
            capability: Capability::GenerateText,
        })
    }

    /// Generate an image from a one-shot prompt.
    async fn generate_image(&self, _prompt: &str) -> Result<ImageArtifact, BackendError> {
        Err(BackendError::Unsupported {
            backend: self.name(),
            capability: Capability::GenerateImage,
        })
    }

    /// Describe an attached image.
    async fn describe_image(&self, _image: &[u8]) -> Result<String, BackendError> {
        Err(BackendError::Unsupported {
            backend: self.name(),
            capability: Capability::DescribeImage,
        })
    }
}

/// Registry mapping backend kinds to adapter implementations.
#[derive(Default)]
pub struct BackendRegistry {
    adapters: HashMap<BackendKind, Arc<dyn BackendAdapter>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own kind, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Look up the adapter for a backend kind.
    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn BackendAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextOnly;

    #[async_trait]
    impl BackendAdapter for TextOnly {
        fn name(&self) -> &'static str {
            "text-only"
        }
        fn kind(&self) -> BackendKind {
            BackendKind::TextA
        }
        fn supports(&self, capability: Capability) -> bool {
            capability == Capability::GenerateText
        }
        async fn generate_text(&self, context: &[Turn]) -> Result<String, BackendError> {
            Ok(format!("echo of {} turns", context.len()))
        }
    }

    #[tokio::test]
    async fn test_default_methods_return_unsupported() {
        let adapter = TextOnly;

        let err = adapter.generate_image("a fox").await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Unsupported {
                capability: Capability::GenerateImage,
                ..
            }
        ));

        let err = adapter.describe_image(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Unsupported {
                capability: Capability::DescribeImage,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_implemented_capability_works() {
        let adapter = TextOnly;
        let reply = adapter
            .generate_text(&[Turn::user("hi"), Turn::assistant("hello")])
            .await
            .unwrap();
        assert_eq!(reply, "echo of 2 turns");
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = BackendRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(TextOnly));
        assert_eq!(registry.len(), 1);

        let adapter = registry.get(BackendKind::TextA).unwrap();
        assert_eq!(adapter.name(), "text-only");
        assert!(registry.get(BackendKind::Image).is_none());
    }

    #[test]
    fn test_registry_replaces_same_kind() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(TextOnly));
        registry.register(Arc::new(TextOnly));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_supports_reflects_capability_set() {
        let adapter = TextOnly;
        assert!(adapter.supports(Capability::GenerateText));
        assert!(!adapter.supports(Capability::GenerateImage));
        assert!(!adapter.supports(Capability::DescribeImage));
    }
}
