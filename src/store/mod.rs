//! Entity Store Port
//!
//! Everything the traversal builders know about twins comes through the
//! [`TwinStore`] trait. Implementations own retry and caching policy; the
//! builders call each operation at most once per need and propagate errors
//! unchanged.

pub mod memory;

use crate::twin::{ModelId, Relationship, Twin, TwinId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub use memory::{InMemoryTwinStore, StoreCallCounts};

/// Errors raised by an entity store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A referenced twin id does not resolve
    #[error("Twin {0} not found")]
    NotFound(TwinId),

    /// Any other store failure (transport, throttling, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store observed a cancellation request
    #[error("Store call cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of results from a paged store query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Present when more results are available
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, continuation_token: Option<String>) -> Self {
        Self { content, continuation_token }
    }

    /// A final page with no continuation
    pub fn last(content: Vec<T>) -> Self {
        Self { content, continuation_token: None }
    }

    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }
}

/// Filter for twins-by-model queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelQuery {
    pub model_ids: Vec<ModelId>,
    /// When false, twins of models extending one of `model_ids` also match
    pub exact_match: bool,
    /// Restrict to twins located within this twin
    pub location_id: Option<TwinId>,
    pub page_size: usize,
}

impl ModelQuery {
    pub fn new(model_ids: Vec<ModelId>, exact_match: bool, page_size: usize) -> Self {
        Self {
            model_ids,
            exact_match,
            location_id: None,
            page_size,
        }
    }

    pub fn with_location(mut self, location_id: impl Into<TwinId>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }
}

/// Read access to the twins, relationships and models of the entity store
#[async_trait]
pub trait TwinStore: Send + Sync {
    /// Fetch a single twin; `StoreError::NotFound` when it does not exist
    async fn get_twin(&self, id: &TwinId) -> StoreResult<Twin>;

    /// Fetch the twins that exist among `ids`; unknown ids are skipped
    async fn get_twins_by_ids(&self, ids: &[TwinId]) -> StoreResult<Page<Twin>>;

    /// Fetch one page of twins matching a model filter
    async fn get_twins_by_model(
        &self,
        query: &ModelQuery,
        continuation_token: Option<&str>,
    ) -> StoreResult<Page<Twin>>;

    /// Relationships whose source is `twin_id`, optionally restricted to one name
    async fn get_outgoing_relationships(
        &self,
        twin_id: &TwinId,
        name: Option<&str>,
    ) -> StoreResult<Vec<Relationship>>;

    /// Relationships whose target is `twin_id`
    async fn get_incoming_relationships(&self, twin_id: &TwinId) -> StoreResult<Vec<Relationship>>;
}

/// Follow continuation tokens until the store reports no more pages
pub async fn collect_all_pages<T, F, Fut>(mut fetch: F) -> StoreResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = StoreResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = fetch(token.take()).await?;
        items.extend(page.content);
        match page.continuation_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    Ok(items)
}
