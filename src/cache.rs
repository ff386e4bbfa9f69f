//! Process-lifetime knowledge-base cache.
//!
//! One [`KnowledgeBaseCache`] is created at startup and shared (behind an
//! `Arc`) by every request for the rest of the process. The first call to
//! [`KnowledgeBaseCache::load`] runs the source; concurrent first callers
//! wait on the same initialization instead of loading again. After that the
//! knowledge base is only read. There is no refresh or teardown: restart the
//! process to pick up document changes.
//!
//! A failed load is logged and cached as an empty knowledge base, so every
//! later request degrades to empty matches rather than failing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info};

use crate::models::KnowledgeBase;
use crate::traits::KnowledgeSource;

pub struct KnowledgeBaseCache {
    inner: Arc<CacheInner>,
    /// Receiver for the one spawned load task. Set by the first caller.
    pending: OnceLock<watch::Receiver<Option<Arc<KnowledgeBase>>>>,
}

struct CacheInner {
    source: Arc<dyn KnowledgeSource>,
    kb: OnceLock<Arc<KnowledgeBase>>,
    loads: AtomicUsize,
    loaded_at: OnceLock<DateTime<Utc>>,
}

impl KnowledgeBaseCache {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                kb: OnceLock::new(),
                loads: AtomicUsize::new(0),
                loaded_at: OnceLock::new(),
            }),
            pending: OnceLock::new(),
        }
    }

    /// Return the knowledge base, loading it on first use.
    ///
    /// The load runs on its own task, so it completes even when the caller
    /// that started it is dropped; later callers wait on the same task.
    pub async fn load(&self) -> Arc<KnowledgeBase> {
        if let Some(kb) = self.inner.kb.get() {
            return Arc::clone(kb);
        }

        let mut rx = self
            .pending
            .get_or_init(|| {
                let (tx, rx) = watch::channel(None);
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    let kb = inner.populate().await;
                    let _ = tx.send(Some(kb));
                });
                rx
            })
            .clone();

        let ready = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|kb| (*kb).clone());

        match ready.or_else(|| self.inner.kb.get().cloned()) {
            Some(kb) => kb,
            None => {
                error!("knowledge base load task ended without a result");
                Arc::new(KnowledgeBase::default())
            }
        }
    }

    /// The knowledge base if it has already been loaded.
    pub fn get(&self) -> Option<Arc<KnowledgeBase>> {
        self.inner.kb.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.kb.get().is_some()
    }

    /// How many times the source has been run. Never more than one.
    pub fn load_count(&self) -> usize {
        self.inner.loads.load(Ordering::SeqCst)
    }

    /// When the load finished, successful or not.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.inner.loaded_at.get().copied()
    }

    pub fn source_label(&self) -> String {
        let source = &self.inner.source;
        format!("{} ({})", source.name(), source.description())
    }
}

impl CacheInner {
    async fn populate(&self) -> Arc<KnowledgeBase> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();

        let kb = match self.source.load().await {
            Ok(kb) => {
                info!(
                    source = self.source.name(),
                    algorithms = kb.algorithms.len(),
                    clinical_details = kb.clinical_details.len(),
                    breed_risks = kb.breed_risks.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "knowledge base loaded"
                );
                kb
            }
            Err(e) => {
                error!(
                    source = self.source.name(),
                    error = %format!("{:#}", e),
                    "knowledge base load failed, continuing with an empty knowledge base"
                );
                KnowledgeBase::default()
            }
        };

        let _ = self.loaded_at.set(Utc::now());
        Arc::clone(self.kb.get_or_init(|| Arc::new(kb)))
    }
}
