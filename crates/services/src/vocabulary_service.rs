use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use storage::repository::VocabularyRepository;
use vocab_core::model::VocabularyItem;

/// Which tier ultimately answered a vocabulary fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    Remote,
    Local,
    Embedded,
}

impl SourceTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTier::Remote => "remote",
            SourceTier::Local => "local",
            SourceTier::Embedded => "embedded",
        }
    }
}

/// Status emitted after every fetch so UI can render a degraded-mode
/// indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStatus {
    pub is_online: bool,
    pub tier: SourceTier,
}

impl SourceStatus {
    fn for_tier(tier: SourceTier) -> Self {
        Self {
            is_online: tier == SourceTier::Remote,
            tier,
        }
    }
}

/// Observer for data-source status changes.
pub trait StatusListener: Send + Sync {
    fn on_status(&self, status: SourceStatus);
}

/// Outcome of a tiered fetch: the items (if any tier produced a non-empty
/// set) plus the status that was reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResolution {
    pub items: Option<Vec<VocabularyItem>>,
    pub status: SourceStatus,
}

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Tiered vocabulary loader: remote store, then a local JSON file, then the
/// caller's embedded defaults.
///
/// The fallback chain *is* the error-handling policy: remote errors,
/// timeouts, and empty payloads are all treated as a miss and logged, never
/// propagated. Successful remote reads are cached per kind for the lifetime
/// of the service instance.
pub struct VocabularyService {
    remote: Arc<dyn VocabularyRepository>,
    local_dir: Option<PathBuf>,
    remote_timeout: Duration,
    cache: Mutex<HashMap<String, Vec<VocabularyItem>>>,
    listener: Mutex<Option<Arc<dyn StatusListener>>>,
}

impl VocabularyService {
    #[must_use]
    pub fn new(remote: Arc<dyn VocabularyRepository>) -> Self {
        Self {
            remote,
            local_dir: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            cache: Mutex::new(HashMap::new()),
            listener: Mutex::new(None),
        }
    }

    /// Directory holding local fallback files, one `<kind>.json` per kind.
    #[must_use]
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    /// Bound on how long the remote tier may take before it counts as a miss.
    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Register the status observer. Replaces any previous listener.
    pub fn set_status_listener(&self, listener: Arc<dyn StatusListener>) {
        let mut guard = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(listener);
    }

    /// Drop all cached remote reads.
    pub fn clear_cache(&self) {
        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
    }

    /// Fetch the vocabulary set for `kind`, or `None` when every tier
    /// missed (the caller must then supply embedded defaults).
    pub async fn fetch(&self, kind: &str) -> Option<Vec<VocabularyItem>> {
        self.resolve(kind).await.items
    }

    /// Fetch with the resolved tier attached, for callers that record which
    /// source fed the session.
    pub async fn resolve(&self, kind: &str) -> SourceResolution {
        if let Some(items) = self.cached(kind) {
            return self.resolved(Some(items), SourceTier::Remote);
        }

        if let Some(items) = self.fetch_remote(kind).await {
            self.cache_remote(kind, &items);
            return self.resolved(Some(items), SourceTier::Remote);
        }

        if let Some(items) = self.fetch_local(kind).await {
            return self.resolved(Some(items), SourceTier::Local);
        }

        self.resolved(None, SourceTier::Embedded)
    }

    async fn fetch_remote(&self, kind: &str) -> Option<Vec<VocabularyItem>> {
        // The slower side of the race is dropped, not actively aborted.
        match tokio::time::timeout(self.remote_timeout, self.remote.fetch_set(kind)).await {
            Ok(Ok(Some(items))) if !items.is_empty() => Some(items),
            Ok(Ok(Some(_))) => {
                log::warn!("remote store returned empty set for '{kind}', falling back");
                None
            }
            Ok(Ok(None)) => {
                log::warn!("remote store has no set for '{kind}', falling back");
                None
            }
            Ok(Err(e)) => {
                log::warn!("remote store failed for '{kind}': {e}, falling back");
                None
            }
            Err(_) => {
                log::warn!(
                    "remote store timed out after {:?} for '{kind}', falling back",
                    self.remote_timeout
                );
                None
            }
        }
    }

    async fn fetch_local(&self, kind: &str) -> Option<Vec<VocabularyItem>> {
        let dir = self.local_dir.as_ref()?;
        let path = dir.join(format!("{kind}.json"));
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("local file {} unreadable: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_slice::<Vec<VocabularyItem>>(&raw) {
            Ok(items) if !items.is_empty() => Some(items),
            Ok(_) => {
                log::warn!("local file {} is empty, falling back", path.display());
                None
            }
            Err(e) => {
                log::warn!("local file {} unparsable: {e}", path.display());
                None
            }
        }
    }

    fn cached(&self, kind: &str) -> Option<Vec<VocabularyItem>> {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(kind).cloned()
    }

    fn cache_remote(&self, kind: &str, items: &[VocabularyItem]) {
        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(kind.to_string(), items.to_vec());
    }

    fn resolved(&self, items: Option<Vec<VocabularyItem>>, tier: SourceTier) -> SourceResolution {
        let status = SourceStatus::for_tier(tier);
        self.notify(status);
        SourceResolution { items, status }
    }

    fn notify(&self, status: SourceStatus) {
        let listener = {
            let guard = self
                .listener
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };
        if let Some(listener) = listener {
            listener.on_status(status);
        }
    }
}
