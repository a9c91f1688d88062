use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use storage::repository::{StorageError, VocabularyRepository};
use vocab_core::model::VocabularyItem;

/// HTTP-backed remote vocabulary source.
///
/// Reads fixed per-kind paths (`{base}/vocabulary/{kind}.json`) from a
/// hosted store. A 404 is an ordinary miss; everything else non-success is
/// a connection error for the vocabulary service to swallow.
#[derive(Clone)]
pub struct HttpVocabularySource {
    client: Client,
    base_url: String,
}

impl HttpVocabularySource {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn set_url(&self, kind: &str) -> String {
        format!(
            "{}/vocabulary/{kind}.json",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl VocabularyRepository for HttpVocabularySource {
    async fn fetch_set(&self, kind: &str) -> Result<Option<Vec<VocabularyItem>>, StorageError> {
        let response = self
            .client
            .get(self.set_url(kind))
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StorageError::Connection(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let items: Vec<VocabularyItem> = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(items))
    }
}
