//! Vector Search
//!
//! k-NN retrieval of log messages and the session-scoped query cache that
//! sits in front of the whole retrieval + synthesis flow.

pub mod cache;
mod opensearch;
mod signing;

pub use cache::{CacheStats, QueryCache};
pub use opensearch::{OpenSearchBackend, SearchAuth, knn_query};
pub use signing::SigV4Signer;

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::Result;

/// Nearest-neighbour search over embedded log records
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Message texts of the `k` records closest to `vector`, best first
    async fn knn(&self, vector: &[f64], k: usize) -> Result<Vec<String>>;
}

#[async_trait]
impl<B: SearchBackend + ?Sized> SearchBackend for Arc<B> {
    async fn knn(&self, vector: &[f64], k: usize) -> Result<Vec<String>> {
        (**self).knn(vector, k).await
    }
}
