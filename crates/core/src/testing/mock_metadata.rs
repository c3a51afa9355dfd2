//! Mock metadata provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::isbn::Isbn;
use crate::metadata::{BookMetadata, MetadataError, MetadataProvider};

/// Mock implementation of the MetadataProvider trait.
///
/// Provides controllable behavior for testing:
/// - Return configured books by ISBN
/// - Track lookups for assertions
/// - Simulate one-off or permanent failures
#[derive(Debug)]
pub struct MockMetadataProvider {
    name: String,
    /// Known books by ISBN.
    books: Arc<RwLock<HashMap<Isbn, BookMetadata>>>,
    /// Recorded lookups.
    lookups: Arc<RwLock<Vec<Isbn>>>,
    /// If set, the next lookup will fail with this error.
    next_error: Arc<RwLock<Option<MetadataError>>>,
    /// When true every lookup fails.
    failing: Arc<RwLock<bool>>,
}

impl Default for MockMetadataProvider {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockMetadataProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            books: Arc::new(RwLock::new(HashMap::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing: Arc::new(RwLock::new(false)),
        }
    }

    /// Add a book, replacing any previous entry for its ISBN.
    pub async fn add_book(&self, metadata: BookMetadata) {
        self.books
            .write()
            .await
            .insert(metadata.isbn.clone(), metadata);
    }

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: MetadataError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every lookup fail (as an unreachable service would).
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn recorded_lookups(&self) -> Vec<Isbn> {
        self.lookups.read().await.clone()
    }

    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookMetadata>, MetadataError> {
        self.lookups.write().await.push(isbn.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if *self.failing.read().await {
            return Err(MetadataError::ApiError {
                status: 503,
                message: format!("{} unavailable", self.name),
            });
        }

        Ok(self.books.read().await.get(isbn).cloned())
    }
}
