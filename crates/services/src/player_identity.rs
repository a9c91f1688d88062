use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use vocab_core::model::{PlayerName, PlayerNameError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentityStoreError {
    #[error("identity store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interactive collaborator that asks the player for a name.
///
/// Returning `None` means the prompt gave up (headless environment, user
/// dismissed it); identity resolution then fails and session tracking is
/// disabled for the run.
#[async_trait]
pub trait NamePrompt: Send + Sync {
    async fn prompt_name(&self) -> Option<String>;
}

/// A prompt that never answers, for headless use.
pub struct NoPrompt;

#[async_trait]
impl NamePrompt for NoPrompt {
    async fn prompt_name(&self) -> Option<String> {
        None
    }
}

/// Durable storage for the resolved player name.
pub trait IdentityStore: Send + Sync {
    /// Load the persisted name, if any.
    ///
    /// # Errors
    ///
    /// Returns `IdentityStoreError` if the backing store cannot be read.
    fn load(&self) -> Result<Option<String>, IdentityStoreError>;

    /// Persist the name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityStoreError` if the backing store cannot be written.
    fn save(&self, name: &str) -> Result<(), IdentityStoreError>;

    /// Remove the persisted name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityStoreError` if the backing store cannot be written.
    fn clear(&self) -> Result<(), IdentityStoreError>;
}

/// Plain-file identity store, one name per file.
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<String>, IdentityStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, name: &str) -> Result<(), IdentityStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, name)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory identity store for tests and prototyping.
#[derive(Default)]
pub struct MemoryIdentityStore {
    value: Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, as if a name had been persisted earlier.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(name.into())),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<String>, IdentityStoreError> {
        let guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save(&self, name: &str) -> Result<(), IdentityStoreError> {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(name.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}

/// Resolves and caches the stable player identifier.
///
/// Prompt-once, cache-forever: the first `resolve` may block on the prompt
/// collaborator; every later call returns the cached name. Store write
/// failures are logged and ignored; the in-process cache still works for
/// the rest of the run.
pub struct PlayerIdentity {
    store: Arc<dyn IdentityStore>,
    prompt: Arc<dyn NamePrompt>,
    cached: Mutex<Option<PlayerName>>,
}

impl PlayerIdentity {
    #[must_use]
    pub fn new(store: Arc<dyn IdentityStore>, prompt: Arc<dyn NamePrompt>) -> Self {
        Self {
            store,
            prompt,
            cached: Mutex::new(None),
        }
    }

    /// Resolve the player name, prompting if nothing is persisted.
    ///
    /// Loops until the prompt supplies a non-empty name, or gives up when
    /// the prompt itself declines (`None`).
    pub async fn resolve(&self) -> Option<PlayerName> {
        if let Some(name) = self.resolve_silent() {
            return Some(name);
        }

        loop {
            let raw = self.prompt.prompt_name().await?;
            match PlayerName::new(&raw) {
                Ok(name) => {
                    if let Err(e) = self.store.save(name.as_str()) {
                        log::warn!("failed to persist player name: {e}");
                    }
                    self.set_cached(Some(name.clone()));
                    return Some(name);
                }
                Err(_) => {
                    // Blank input, ask again.
                }
            }
        }
    }

    /// Resolve without prompting: cache first, then the persisted store.
    #[must_use]
    pub fn resolve_silent(&self) -> Option<PlayerName> {
        if let Some(name) = self.cached() {
            return Some(name);
        }

        let raw = match self.store.load() {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("failed to read player name: {e}");
                return None;
            }
        };
        let name = PlayerName::new(raw).ok()?;
        self.set_cached(Some(name.clone()));
        Some(name)
    }

    /// Administrative override: normalize, persist, and cache a name.
    ///
    /// # Errors
    ///
    /// Returns `PlayerNameError` if the input is blank after trimming.
    pub fn set(&self, raw: &str) -> Result<PlayerName, PlayerNameError> {
        let name = PlayerName::new(raw)?;
        if let Err(e) = self.store.save(name.as_str()) {
            log::warn!("failed to persist player name: {e}");
        }
        self.set_cached(Some(name.clone()));
        Ok(name)
    }

    /// Forget the persisted and cached identity.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("failed to clear player name: {e}");
        }
        self.set_cached(None);
    }

    fn cached(&self) -> Option<PlayerName> {
        let guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    fn set_cached(&self, value: Option<PlayerName>) {
        let mut guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingPrompt {
        answers: Mutex<Vec<Option<String>>>,
        calls: AtomicU32,
    }

    impl CountingPrompt {
        fn new(answers: Vec<Option<String>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl NamePrompt for CountingPrompt {
        async fn prompt_name(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn resolve_prompts_once_then_caches() {
        let prompt = Arc::new(CountingPrompt::new(vec![Some("  Anna ".to_string())]));
        let identity = PlayerIdentity::new(Arc::new(MemoryIdentityStore::new()), prompt.clone());

        let first = identity.resolve().await.unwrap();
        let second = identity.resolve().await.unwrap();

        assert_eq!(first.as_str(), "anna");
        assert_eq!(first, second);
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolve_loops_past_blank_input() {
        let prompt = Arc::new(CountingPrompt::new(vec![
            Some("   ".to_string()),
            Some("Ben".to_string()),
        ]));
        let identity = PlayerIdentity::new(Arc::new(MemoryIdentityStore::new()), prompt.clone());

        let name = identity.resolve().await.unwrap();
        assert_eq!(name.as_str(), "ben");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resolve_gives_up_when_prompt_declines() {
        let prompt = Arc::new(CountingPrompt::new(vec![None]));
        let identity = PlayerIdentity::new(Arc::new(MemoryIdentityStore::new()), prompt);

        assert!(identity.resolve().await.is_none());
    }

    #[tokio::test]
    async fn persisted_name_skips_the_prompt() {
        let store = Arc::new(MemoryIdentityStore::with_name("Carla"));
        let prompt = Arc::new(CountingPrompt::new(vec![]));
        let identity = PlayerIdentity::new(store, prompt.clone());

        let name = identity.resolve().await.unwrap();
        assert_eq!(name.as_str(), "carla");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resolve_silent_never_prompts() {
        let identity =
            PlayerIdentity::new(Arc::new(MemoryIdentityStore::new()), Arc::new(NoPrompt));
        assert!(identity.resolve_silent().is_none());
    }

    #[test]
    fn set_and_clear_update_store_and_cache() {
        let store = Arc::new(MemoryIdentityStore::new());
        let identity = PlayerIdentity::new(store.clone(), Arc::new(NoPrompt));

        let name = identity.set(" Dora ").unwrap();
        assert_eq!(name.as_str(), "dora");
        assert_eq!(store.load().unwrap().as_deref(), Some("dora"));
        assert_eq!(identity.resolve_silent(), Some(name));

        identity.clear();
        assert!(store.load().unwrap().is_none());
        assert!(identity.resolve_silent().is_none());
    }

    #[test]
    fn file_store_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "vocab-identity-{}/player.txt",
            std::process::id()
        ));
        let store = FileIdentityStore::new(&path);
        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        store.save("anna").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("anna"));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
