//! Extension traits for knowledge sources and chat models.
//!
//! The context builder is one pure function over a [`KnowledgeBase`]; each
//! deployment supplies the knowledge base through a [`KnowledgeSource`] and
//! the language model through a [`ChatModel`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────┐
//! │        KnowledgeSource        │
//! │  ┌────────────┐ ┌──────────┐  │
//! │  │ Filesystem │ │  Bundle  │  │
//! │  │ YAML walk  │ │  (JSON)  │  │
//! │  └────────────┘ └──────────┘  │
//! └──────────────┬────────────────┘
//!                ▼
//!      KnowledgeBaseCache (once)
//!                ▼
//!      build_context() per request ──▶ ChatModel
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use triage_harness::cache::KnowledgeBaseCache;
//! use triage_harness::sources::BundleKnowledgeSource;
//!
//! let source = BundleKnowledgeSource::from_json_str("inline", r#"{"algorithms": []}"#);
//! let cache = KnowledgeBaseCache::new(Arc::new(source));
//! assert_eq!(cache.load_count(), 0);
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::llm::ChatMessage;
use crate::models::KnowledgeBase;

// ═══════════════════════════════════════════════════════════════════════
// KnowledgeSource Trait
// ═══════════════════════════════════════════════════════════════════════

/// Something that can produce the full knowledge base in one pass.
///
/// Implementations are called at most once per process through
/// [`crate::cache::KnowledgeBaseCache`]. An error is logged by the cache
/// and replaced with an empty knowledge base; it never aborts the process.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use triage_harness::models::KnowledgeBase;
/// use triage_harness::traits::KnowledgeSource;
///
/// pub struct EmptySource;
///
/// #[async_trait]
/// impl KnowledgeSource for EmptySource {
///     fn name(&self) -> &str { "empty" }
///     fn description(&self) -> &str { "Always loads an empty knowledge base" }
///
///     async fn load(&self) -> Result<KnowledgeBase> {
///         Ok(KnowledgeBase::default())
///     }
/// }
/// ```
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Returns the source name (e.g. `"filesystem"`, `"bundle"`).
    fn name(&self) -> &str;

    /// Returns a one-line description, including where the data comes from.
    fn description(&self) -> &str;

    /// Load, classify and normalize every document.
    async fn load(&self) -> Result<KnowledgeBase>;
}

// ═══════════════════════════════════════════════════════════════════════
// ChatModel Trait
// ═══════════════════════════════════════════════════════════════════════

/// An opaque language model: send messages, get text back.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used in logs.
    fn model_name(&self) -> &str;

    /// Returns the assistant reply for the given conversation.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
